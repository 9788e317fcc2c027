//! Natural-language-to-SQL basketball statistics query pipeline.
//!
//! The hot path is `pipeline::answer`: user text in, a single
//! [`models::ResultEnvelope`] out. Everything else in this crate exists to
//! support that one call: configuration, the data access layer, the
//! remote model providers, and the thin HTTP handler that wraps it.

rust_i18n::i18n!("locales", fallback = "es");

pub mod config;
pub mod context;
pub mod db;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod utils;
