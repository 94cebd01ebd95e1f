//! Shared test utilities for Keyver crates.
//!
//! This crate provides common test helpers to reduce boilerplate across test modules:
//!
//! - [`assert_eventually`] - Poll a condition until it's true or timeout
//! - [`test_registry`] - Registry over a fresh in-memory store with fast retries
//! - [`fixtures`] - Raw store writes for setting up corrupt histories
//! - [`strategies`] - Proptest generators for names, values and version numbers

#![deny(unsafe_code)]
// Test utilities are allowed to use expect for simplicity
#![allow(clippy::expect_used)]

mod assertions;
pub use assertions::assert_eventually;

mod config;
pub use config::{test_registry, test_registry_config, test_registry_with, test_retry_policy};

pub mod fixtures;
pub mod strategies;
