//! End-to-End Integration Tests
//!
//! These tests drive the complete assertion validation pipeline with real
//! ECDSA signatures produced by a throwaway identity provider key.

mod common;
mod concurrency;
mod configuration;
mod end_to_end;
mod pipeline;
mod signatures;
