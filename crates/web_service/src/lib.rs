pub mod auth;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod server;
pub mod services;
pub mod storage;

pub use config::{AiConfig, AppConfig, Environment};
pub use server::{app_config, run, AppState, ServerError};
