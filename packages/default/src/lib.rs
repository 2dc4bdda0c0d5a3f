pub mod auth;
pub mod cloud;
pub mod config;
pub mod handlers;
pub mod import;
pub mod models;
pub mod queries;
pub mod reconciler;
pub mod server;
pub mod store;
