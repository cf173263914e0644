pub mod database;
pub mod session;
pub mod upsert;
