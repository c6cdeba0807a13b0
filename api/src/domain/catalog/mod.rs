pub mod discount;
pub mod product;
