pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod flight_repo;
pub mod memory;
pub mod order_repo;
pub mod user_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;
