//! DocVault Server Library
//!
//! Loads PDF, Word, Excel and PowerPoint documents (optionally password
//! protected) into a bounded in-memory cache and serves their content.
//!
//! # Modules
//!
//! - `document`: Format-agnostic types, the LRU cache and text analysis
//! - `password`: Exact and glob password registrations, sidecar detection
//! - `crypto`: Decryption gateways for encrypted PDF and OOXML files
//! - `formats`: Per-format parsers and the loader registry
//! - `service`: Operations combining loaders, passwords and cache
//! - `routes`: HTTP API

pub mod config;
pub mod crypto;
pub mod document;
pub mod error;
pub mod formats;
pub mod password;
pub mod routes;
pub mod service;
pub mod state;
