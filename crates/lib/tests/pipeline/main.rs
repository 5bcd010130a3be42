//! End-to-end tests for the documentation build pipeline.

mod common;
mod end_to_end_tests;
