pub mod app;
pub mod client;
pub mod jobs;
pub mod modules;
pub mod types;
pub mod utils;
