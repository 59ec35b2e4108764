//! Core domain + application logic for the Satya.ai fact-check bot.
//!
//! This crate is intentionally framework-agnostic. Telegram, OCR and the LLM
//! endpoint live behind ports (traits) implemented in adapter crates.

pub mod analysis;
pub mod article;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod pipeline;
pub mod ports;

pub use errors::{Error, Result};
