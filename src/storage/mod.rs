pub mod database;
pub mod sessions;

pub use database::Database;
pub use sessions::{SessionHandle, SessionRegistry};
