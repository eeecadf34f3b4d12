pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod store;
pub mod sweeper;
