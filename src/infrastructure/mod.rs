pub mod database;
pub mod logger;

pub use database::DatabaseManager;
pub use logger::Logger;
