//! aemet-opendata library
//!
//! This crate provides the core functionality for the `aemet` binary: a client for the
//! AEMET OpenData service that survives rate limits by rotating API keys, and an
//! extractor for the archives the service hands out.
//!
//! ## Overview
//!
//! - [`fetcher`] - Metadata calls with key rotation and backoff, envelope handling and data downloads
//! - [`extractor`] - Format detection by magic bytes and extraction of tar.gz, tar.bz2, zip and tar buffers
//! - [`datasets`] - Climatology series, climate normals and extremes, CAP weather warnings
//! - [`dates`] - Date-string validation and splitting of long ranges into request windows
//! - [`endpoints`] - Endpoint paths per dataset and the alias catalog used by the CLI
//! - [`cli`] - Command-line interface
//! - [`config`] - TOML configuration and API key resolution
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use aemet_opendata::{config::ResolvedConfig, datasets, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! let config = ResolvedConfig {
//!     api_keys: vec!["first-key".to_string(), "second-key".to_string()],
//!     ..ResolvedConfig::default()
//! };
//! let client = reqwest::Client::new();
//!
//! let records = datasets::daily_climatology(
//!     &client,
//!     &config,
//!     &["3195".to_string()],
//!     "2022-01-01",
//!     "2022-12-31",
//! )
//! .await?;
//! println!("{} daily records", records.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod datasets;
pub mod dates;
pub mod endpoints;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod utils;
