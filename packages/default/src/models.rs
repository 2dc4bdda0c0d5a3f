pub mod aws_resources;
pub mod azure_subscriptions;
pub mod config;
pub mod environments;
