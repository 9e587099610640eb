//! Integration tests for per-owner tree stores

mod support;

mod concurrent_edits;
mod handler_contracts;
mod tree_scenarios;
