pub mod canvas;
pub mod chat;
pub mod config;
pub mod csvio;
pub mod dedup;
pub mod drive;
pub mod error;
pub mod models;
pub mod pace;
pub mod services;
