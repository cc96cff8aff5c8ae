//! Testing utilities for pulse-sdk.
//!
//! This module provides mock sinks, a mock collector, and fixtures for testing
//! the engine without a real collector.
//!
//! # Components
//!
//! - [`fixtures`]: Common configs, provider responses, and trace records
//! - [`mock_sink`]: In-memory sink with batch capture and failure mode
//! - [`mock_collector`]: HTTP mock collector for end-to-end tests

pub mod fixtures;
pub mod mock_collector;
pub mod mock_sink;

pub use fixtures::*;
pub use mock_collector::MockCollector;
pub use mock_sink::MockSink;
