use serde::Serialize;

pub mod admin;
pub mod auth;
pub mod categories;
pub mod discounts;
pub mod error;
pub mod orders;
pub mod payments;
pub mod products;
pub mod router_table;
pub mod user_data;

/// `{"success": true, "count": n, "data": [...]}`
#[derive(Serialize)]
pub struct Listing<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// `{"success": true, "data": ...}`
#[derive(Serialize)]
pub struct Item<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Item<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
