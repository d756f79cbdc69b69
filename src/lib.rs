//! Client-certificate authentication for axum services.
//!
//! The core lives in [`services::auth`]: a handler that reads the client
//! certificate for a request, validates it, maps it to an [`Identity`] and
//! lets event callbacks override the outcome. The rest of the crate wires
//! it into an HTTP service.
//!
//! [`Identity`]: services::auth::Identity

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
