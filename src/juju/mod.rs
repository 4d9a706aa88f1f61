//! # Juju Model Access
//!
//! The seam between the reconciliation logic and the Juju hook environment.
//!
//! Everything the operator reads or writes — leadership, config, secrets,
//! relation data, unit status — goes through the [`Model`] trait. Production
//! code uses [`hooks::HookModel`], which shells out to the Juju hook tools;
//! tests use [`testing::FakeModel`], an in-memory stand-in with the same
//! semantics.

use std::collections::BTreeMap;

use thiserror::Error;

pub mod hooks;
pub mod testing;

pub use hooks::HookModel;

/// Integer id of a Juju relation (the `0` in `database:0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub u32);

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved reference to a Juju secret.
///
/// Carries the configured id (when one is set) and the fixed label; content
/// reads pass both back to the store so label association survives secret
/// rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub id: Option<String>,
    pub label: String,
}

/// Externally visible unit health
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Active,
    Blocked(String),
}

impl Status {
    /// Status name as the `status-set` hook tool expects it
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Blocked(_) => "blocked",
        }
    }

    /// Operator-facing message; empty for `Active`
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Status::Active => "",
            Status::Blocked(message) => message,
        }
    }
}

/// Error type for model store access
///
/// `SecretNotFound` and `PermissionDenied` are recoverable by operator action
/// and convert to a Blocked status upstream; the remaining variants are
/// generic store failures and propagate fatally to the dispatch boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("secret not found: {0}")]
    SecretNotFound(String),
    #[error("access to secret denied: {0}")]
    PermissionDenied(String),
    #[error("relation {0} not found")]
    RelationNotFound(RelationId),
    #[error("hook tool `{tool}` failed: {message}")]
    Tool { tool: String, message: String },
    #[error("malformed hook tool output: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Access to the Juju model from inside a hook invocation.
///
/// All calls are synchronous request/response against the controller; no
/// retry or timeout policy is layered on top. A failure surfaces immediately
/// as a [`ModelError`].
pub trait Model {
    /// Name of the model this unit is deployed in (used in operator-facing
    /// error messages)
    fn model_name(&self) -> String;

    /// Whether this unit currently holds application leadership
    fn is_leader(&self) -> Result<bool, ModelError>;

    /// Read a charm config option; `None` when unset
    fn config_value(&self, key: &str) -> Result<Option<String>, ModelError>;

    /// Resolve a secret by id and/or label without consuming its content
    fn get_secret(&self, id: Option<&str>, label: &str) -> Result<SecretRef, ModelError>;

    /// Read a secret's current content. `refresh` forces the latest revision
    /// rather than the tracked one; the URI secret may rotate underneath us.
    fn secret_content(
        &self,
        secret: &SecretRef,
        refresh: bool,
    ) -> Result<BTreeMap<String, String>, ModelError>;

    /// Ids of all joined relations of the named integration
    fn relation_ids(&self, integration: &str) -> Result<Vec<RelationId>, ModelError>;

    /// The remote application's data bag on a relation
    fn remote_app_data(&self, id: RelationId) -> Result<BTreeMap<String, String>, ModelError>;

    /// Write one field of this application's data bag on a relation
    fn relation_set_field(
        &self,
        id: RelationId,
        key: &str,
        value: &str,
    ) -> Result<(), ModelError>;

    /// Publish the unit's workload status
    fn set_unit_status(&self, status: &Status) -> Result<(), ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_name_and_message() {
        assert_eq!(Status::Active.name(), "active");
        assert_eq!(Status::Active.message(), "");

        let blocked = Status::Blocked("something is wrong".to_string());
        assert_eq!(blocked.name(), "blocked");
        assert_eq!(blocked.message(), "something is wrong");
    }

    #[test]
    fn test_relation_id_display() {
        assert_eq!(RelationId(7).to_string(), "7");
    }
}
