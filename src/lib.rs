pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, Result};
