//! Property-based tests for the hash database

mod determinism;
