//! REST API access: transport, wire models and the per-resource client.

pub mod client;
pub mod models;
pub mod resource;

pub use client::StockroomClient;
pub use resource::{ResourceApi, ResourceClient};
