//! Library catalog REST API: books, categories, reservations and user
//! accounts over MongoDB, served with actix-web.

pub mod api;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod seeds;
pub mod services;
pub mod state;
pub mod utils;
