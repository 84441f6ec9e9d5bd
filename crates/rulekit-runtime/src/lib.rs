//! # rulekit-runtime
//!
//! Hook runtime wiring rule discovery, session state, and prompt injection.
//!
//! The host drives [`RulesRuntime`] through async callbacks: tool
//! observation, history seeding, prompt capture, system prompt transform,
//! and compaction context. Capability queries run against a host-provided
//! [`CapabilitySource`]; settings load through layered figment sources.

#![deny(unsafe_code)]

pub mod capabilities;
pub mod errors;
pub mod logging;
pub mod runtime;
pub mod settings;

pub use capabilities::{
    connected_capability_ids, query_capability_ids, sanitize_service_name, CapabilitySource,
    ServiceStatusMap,
};
pub use errors::{CapabilityError, SettingsError};
pub use logging::init_subscriber;
pub use runtime::RulesRuntime;
pub use settings::{load_settings, load_settings_from_path, settings_path, RulekitSettings};
