//! Structured application errors for axum services: a small error taxonomy,
//! a required-field guard middleware, and a configurable error responder.

pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod paths;
pub mod responder;
