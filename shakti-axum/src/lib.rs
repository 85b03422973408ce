//! shakti-axum: Axum adapter for Shakti services.

pub mod app;
mod error;
pub mod params;
pub mod rest;
pub mod tenancy;

pub use app::{axum, AxumApp};
pub use error::AxumError;
pub use params::{FromRestParams, RestParams};
