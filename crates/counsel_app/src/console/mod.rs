//! Headless terminal console over the in-memory backend.
mod app;
mod commands;
mod config;
mod persistence;
mod render;

pub use app::run;
