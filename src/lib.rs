pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod service;
pub mod tmdb;
