//! Shared test utilities for leadrelay integration tests.
//!
//! This module provides:
//! - `FakeMailbox`, an in-memory `MailTransport` with fault injection
//! - `RecordingSink`, a `CrmSink` that records leads and can be told to fail
//! - `TestHarness` wiring both to a temporary processed-id store
//! - Builders for lead notification emails

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
