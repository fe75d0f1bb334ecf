pub mod config;
pub mod extract;
pub mod read;
pub mod voices;
