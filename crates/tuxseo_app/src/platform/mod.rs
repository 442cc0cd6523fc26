mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod notify;
mod persistence;
mod render;

pub use app::run_app;
