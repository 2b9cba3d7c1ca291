//! API Module
//!
//! HTTP facade over the cache client.
//!
//! # Endpoints
//! - `GET /images/:id` - Image bytes, from cache or backend
//! - `GET /stats` - Performance report
//! - `PUT /strategy` - Switch eviction strategy (cold start)
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
