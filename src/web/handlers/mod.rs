pub mod system;
pub mod models;
