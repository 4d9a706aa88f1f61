//! # In-Memory Test Model
//!
//! [`FakeModel`] implements [`Model`] against in-memory state so the charm
//! logic can be exercised without a Juju controller. Used by the unit tests
//! in this crate and the integration tests under `tests/`.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{Model, ModelError, RelationId, SecretRef, Status};

#[derive(Debug, Clone)]
struct FakeSecret {
    id: String,
    label: String,
    content: BTreeMap<String, String>,
    granted: bool,
}

#[derive(Debug, Default, Clone)]
struct FakeRelation {
    remote_app_data: BTreeMap<String, String>,
    local_app_data: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    leader: bool,
    model_name: String,
    config: BTreeMap<String, String>,
    secrets: Vec<FakeSecret>,
    relations: BTreeMap<RelationId, FakeRelation>,
    status_log: Vec<Status>,
    refreshed_reads: u32,
}

/// In-memory [`Model`] for tests
#[derive(Debug, Default)]
pub struct FakeModel {
    state: RefCell<State>,
}

impl FakeModel {
    #[must_use]
    pub fn new() -> Self {
        let model = Self::default();
        model.state.borrow_mut().model_name = "testing".to_string();
        model
    }

    #[must_use]
    pub fn with_leader(self, leader: bool) -> Self {
        self.state.borrow_mut().leader = leader;
        self
    }

    #[must_use]
    pub fn with_config(self, key: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add a granted secret with a single content field
    #[must_use]
    pub fn with_secret(self, id: &str, label: &str, key: &str, value: &str) -> Self {
        self.state.borrow_mut().secrets.push(FakeSecret {
            id: id.to_string(),
            label: label.to_string(),
            content: BTreeMap::from([(key.to_string(), value.to_string())]),
            granted: true,
        });
        self
    }

    /// Add a secret this application has not been granted access to
    #[must_use]
    pub fn with_ungranted_secret(self, id: &str, label: &str) -> Self {
        self.state.borrow_mut().secrets.push(FakeSecret {
            id: id.to_string(),
            label: label.to_string(),
            content: BTreeMap::new(),
            granted: false,
        });
        self
    }

    /// Join a relation with the given remote application data
    #[must_use]
    pub fn with_relation(self, id: RelationId, remote_app_data: &[(&str, &str)]) -> Self {
        self.state.borrow_mut().relations.insert(
            id,
            FakeRelation {
                remote_app_data: remote_app_data
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                local_app_data: BTreeMap::new(),
            },
        );
        self
    }

    /// Replace a secret's content in place, simulating rotation
    pub fn rotate_secret(&self, label: &str, key: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(secret) = state.secrets.iter_mut().find(|s| s.label == label) {
            secret
                .content
                .insert(key.to_string(), value.to_string());
        }
    }

    /// Every status published so far, oldest first
    #[must_use]
    pub fn status_log(&self) -> Vec<Status> {
        self.state.borrow().status_log.clone()
    }

    /// Most recently published status, if any
    #[must_use]
    pub fn current_status(&self) -> Option<Status> {
        self.state.borrow().status_log.last().cloned()
    }

    /// This application's published data bag on a relation
    #[must_use]
    pub fn local_app_data(&self, id: RelationId) -> BTreeMap<String, String> {
        self.state
            .borrow()
            .relations
            .get(&id)
            .map(|r| r.local_app_data.clone())
            .unwrap_or_default()
    }

    /// Number of forced-refresh secret content reads observed
    #[must_use]
    pub fn refreshed_reads(&self) -> u32 {
        self.state.borrow().refreshed_reads
    }
}

impl Model for FakeModel {
    fn model_name(&self) -> String {
        self.state.borrow().model_name.clone()
    }

    fn is_leader(&self) -> Result<bool, ModelError> {
        Ok(self.state.borrow().leader)
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, ModelError> {
        Ok(self.state.borrow().config.get(key).cloned())
    }

    fn get_secret(&self, id: Option<&str>, label: &str) -> Result<SecretRef, ModelError> {
        let state = self.state.borrow();
        let secret = state
            .secrets
            .iter()
            .find(|s| match id {
                Some(id) => s.id == id,
                None => s.label == label,
            })
            .ok_or_else(|| ModelError::SecretNotFound(label.to_string()))?;

        if !secret.granted {
            return Err(ModelError::PermissionDenied(secret.id.clone()));
        }

        Ok(SecretRef {
            id: id.map(str::to_string),
            label: label.to_string(),
        })
    }

    fn secret_content(
        &self,
        secret: &SecretRef,
        refresh: bool,
    ) -> Result<BTreeMap<String, String>, ModelError> {
        let mut state = self.state.borrow_mut();
        if refresh {
            state.refreshed_reads += 1;
        }
        let found = state
            .secrets
            .iter()
            .find(|s| match secret.id.as_deref() {
                Some(id) => s.id == id,
                None => s.label == secret.label,
            })
            .ok_or_else(|| ModelError::SecretNotFound(secret.label.clone()))?;
        Ok(found.content.clone())
    }

    fn relation_ids(&self, _integration: &str) -> Result<Vec<RelationId>, ModelError> {
        Ok(self.state.borrow().relations.keys().copied().collect())
    }

    fn remote_app_data(&self, id: RelationId) -> Result<BTreeMap<String, String>, ModelError> {
        self.state
            .borrow()
            .relations
            .get(&id)
            .map(|r| r.remote_app_data.clone())
            .ok_or(ModelError::RelationNotFound(id))
    }

    fn relation_set_field(
        &self,
        id: RelationId,
        key: &str,
        value: &str,
    ) -> Result<(), ModelError> {
        let mut state = self.state.borrow_mut();
        let relation = state
            .relations
            .get_mut(&id)
            .ok_or(ModelError::RelationNotFound(id))?;
        relation
            .local_app_data
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_unit_status(&self, status: &Status) -> Result<(), ModelError> {
        self.state.borrow_mut().status_log.push(status.clone());
        Ok(())
    }
}
