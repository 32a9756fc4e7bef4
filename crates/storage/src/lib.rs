//! Storage layer for Risum
//!
//! This crate provides on-device key-value storage.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{keys, KvConfig, KvError, KvStore, LocalStore};
