pub mod app;
pub mod commands;
pub mod domain;
pub mod error;
pub mod infrastructure;
