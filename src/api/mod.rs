//! API Module
//!
//! HTTP handlers and routing for the storage server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value with optional TTL
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Clear a key
//! - `GET /stats` - Get cache statistics
//! - `GET /params` - Extract a query parameter from a URL
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
