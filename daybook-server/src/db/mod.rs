pub mod schema;
pub mod connection;
pub mod convert;
pub mod repositories;

pub use connection::{Database, DbPool};
