//! Provider abstraction: adapter records plus the gateway call path

mod adapter;
mod gateway;

pub use adapter::{adapter, Adapter, Endpoint, GenerationOptions, Provider, WireMessage};
pub use gateway::{ChatRequest, Gateway, GatewayError};
