pub mod api;
pub mod matcher;
pub mod models;
pub mod utils;
