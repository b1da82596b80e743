pub mod database;
pub mod stdio;
