pub mod cache;
pub mod db;

pub use cache::MemoryCache;
pub use db::PgItemStore;
