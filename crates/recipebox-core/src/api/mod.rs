//! REST API client module for the recipe service.
//!
//! This module provides the `ApiClient` for communicating with the recipe
//! service and the `ImageHost` client for the third-party image host.
//!
//! Every response from the recipe service is wrapped in a `{ data, message }`
//! envelope. Authenticated calls carry an opaque bearer token.

pub mod client;
pub mod error;
pub mod image_host;

pub use client::{ApiClient, LoginResponse};
pub use error::ApiError;
pub use image_host::{ImageError, ImageHost};
