pub mod catalog_repository;
pub mod database_connector;
pub mod order_repository;
pub mod session_store;
pub mod user_repository;
