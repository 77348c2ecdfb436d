//! HTTP API for sending Lark / Feishu messages through registered bots.
//!
//! Routes:
//!
//! - `GET /health`
//! - `POST /api/bots`, `GET /api/bots`, `DELETE /api/bots/{id}`
//! - `POST /api/send` (multipart form)
//!
//! The OpenAPI document is served at `/api-doc/openapi.json` with Swagger UI
//! at `/docs`.

pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod serve;
pub mod store_factory;
pub mod telemetry;
