//! Test Fixtures Module
//!
//! Shared helpers for the integration tests:
//! - Audio fixtures (programmatically generated)
//! - Stub speech-synthesis backends

// Allow dead code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod stub_providers;

pub use audio_fixtures::*;
pub use stub_providers::*;
