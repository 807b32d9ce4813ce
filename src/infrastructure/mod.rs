pub mod cloud_foundry;
pub mod config;
pub mod repositories;
pub mod uaa;
