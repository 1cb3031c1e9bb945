//! # API Layer
//!
//! Transport adapters in front of the application layer.

pub mod rest;
