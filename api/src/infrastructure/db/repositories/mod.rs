pub mod catalog_repository_sqlx;
pub mod order_repository_sqlx;
pub mod user_repository_sqlx;
