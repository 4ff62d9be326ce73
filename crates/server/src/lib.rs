pub mod config;
pub mod error;
pub mod live;
pub mod progress;
pub mod routes;
pub mod security;
pub mod state;
