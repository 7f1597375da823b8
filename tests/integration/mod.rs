//! Integration test suite for zigdeps
//!
//! End-to-end tests that drive the real git binary: source repositories are
//! built with [`zigdeps::test_utils::TestGit`], cloned through the sync
//! engine into throwaway cache roots, and the resulting registries are
//! materialized the way a host build description would.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **version_sync**: clone/fetch/switch state machine, idempotence,
//!   dirty-skip behavior, branch-vs-detached checkout modes
//! - **resolution**: full registration flow, import discovery inside cloned
//!   working copies, tree materialization, update-all, lock exclusion

mod resolution;
mod version_sync;
