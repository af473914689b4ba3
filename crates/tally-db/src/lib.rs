pub mod config;
pub mod database;
pub mod list_repository;
pub mod prize_repository;
pub mod task_repository;
pub mod user_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use list_repository::ListRepository;
pub use prize_repository::{PrizeFilter, PrizeRepository};
pub use task_repository::TaskRepository;
pub use user_repository::UserRepository;
