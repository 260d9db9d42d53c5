//! Oglas classifieds kernel library.
//!
//! Exposes the models, query engine, stores and router for integration
//! testing. The server itself runs from the `oglas` binary.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
