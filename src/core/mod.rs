//! Core types and functionality for zigdeps
//!
//! This module forms the foundation of the crate's type system. It currently
//! holds the error-handling layer; every other module propagates failures
//! through the types defined here.
//!
//! # Error Management
//!
//! zigdeps uses a two-level error handling system:
//! - **Strongly-typed errors** ([`ZigdepsError`]) for precise error handling in code
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions,
//!   printed just before a fatal condition terminates the build
//! - [`user_friendly_error`] converts any [`anyhow::Error`] into the latter
//!
//! A resolution run never retries: every fatal condition surfaces immediately
//! as process termination after one [`ErrorContext::display`] call.

pub mod error;

pub use error::{ErrorContext, ZigdepsError, user_friendly_error};
