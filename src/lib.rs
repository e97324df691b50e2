pub mod assets;
pub mod config;
pub mod country;
pub mod database;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod web;
