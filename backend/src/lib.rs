//! Task tracking backend: CRUD over task records behind HTTP Basic auth.
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT`: listen address (default `0.0.0.0:3000`)
//! - `DATABASE_URL`: SQLite file path, or `:memory:` (default `tasks.db`)
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD`, `USER_USERNAME` / `USER_PASSWORD`
//! - `RUST_LOG`: log filter (default `todo_backend=debug,tower_http=debug`)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
