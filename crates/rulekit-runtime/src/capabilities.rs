//! Capability discovery.
//!
//! Conditional rules can require capabilities: builtin tool ids or
//! connected external services. The host exposes both through
//! [`CapabilitySource`]; [`query_capability_ids`] folds the two queries
//! into one id set, tolerating either query failing independently.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::warn;

use crate::errors::CapabilityError;

/// Service name to connection status (`"connected"`, `"failed"`, ...).
pub type ServiceStatusMap = HashMap<String, String>;

/// Host-provided source of capability information.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    /// Ids of the builtin tools currently available.
    async fn builtin_tool_ids(&self) -> Result<Vec<String>, CapabilityError>;

    /// Connection status of each configured external service.
    async fn service_status(&self) -> Result<ServiceStatusMap, CapabilityError>;
}

/// Sanitize a service name for use inside a capability id.
///
/// Anything outside `[A-Za-z0-9_-]` becomes an underscore.
#[must_use]
pub fn sanitize_service_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Capability ids for the connected services in a status map, sorted.
///
/// Each connected service `name` yields `mcp_<sanitized name>`.
#[must_use]
pub fn connected_capability_ids(status: &ServiceStatusMap) -> Vec<String> {
    let mut ids: Vec<String> = status
        .iter()
        .filter(|(_, state)| state.as_str() == "connected")
        .map(|(name, _)| format!("mcp_{}", sanitize_service_name(name)))
        .collect();
    ids.sort();
    ids
}

/// Query both capability sources and merge the results.
///
/// The queries run concurrently. A failing query is logged and contributes
/// nothing; the other query's ids are still returned.
pub async fn query_capability_ids(source: &dyn CapabilitySource) -> HashSet<String> {
    let (tools, services) = futures::join!(source.builtin_tool_ids(), source.service_status());

    let mut ids = HashSet::new();

    match tools {
        Ok(tools) => {
            for tool in tools {
                let _ = ids.insert(tool);
            }
        }
        Err(error) => warn!(%error, "Builtin tool query failed"),
    }

    match services {
        Ok(status) => ids.extend(connected_capability_ids(&status)),
        Err(error) => warn!(%error, "Service status query failed"),
    }

    ids
}
