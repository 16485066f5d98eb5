//! Property-based tests for the resolution core

mod resolution;
