pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod revalidate;
pub mod services;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod testing;

pub use app::app;
