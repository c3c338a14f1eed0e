//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - An in-memory document backend
//! - Test fixtures and builders
//! - PDF inspection helpers
#![allow(dead_code)]

pub mod fake;
pub mod fixtures;
pub mod pdf_helpers;

pub use fake::*;
pub use fixtures::*;
pub use pdf_helpers::*;
