//! # Database Provider Interface
//!
//! Provider side of the `mysql_client` relation interface: enumerate joined
//! client relations and write credential data into them.
//!
//! A client completes its request handshake by setting the `database` field
//! in its application data bag. Writing provider data before that handshake
//! is a contract violation of the interface and surfaces here as
//! [`ProvideError::PrematureDataAccess`]; callers that poll all relations
//! treat it as "not ready yet" rather than a failure.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::constants::DATABASE_REQUEST_FIELD;
use crate::juju::{Model, ModelError, RelationId};

/// Error type for provider-side relation writes
#[derive(Debug, Error)]
pub enum ProvideError {
    #[error("client on relation {0} has not requested a database yet")]
    PrematureDataAccess(RelationId),
    #[error("failed to serialize request payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Provider-side handle on one named database integration
#[derive(Debug)]
pub struct DatabaseProvides<'a, M: Model> {
    model: &'a M,
    integration: &'a str,
}

impl<'a, M: Model> DatabaseProvides<'a, M> {
    #[must_use]
    pub fn new(model: &'a M, integration: &'a str) -> Self {
        Self { model, integration }
    }

    /// Ids of all currently joined client relations
    pub fn relations(&self) -> Result<Vec<RelationId>, ModelError> {
        self.model.relation_ids(self.integration)
    }

    /// The client's request payload, once the handshake is complete
    fn request(&self, id: RelationId) -> Result<BTreeMap<String, String>, ProvideError> {
        let remote = self.model.remote_app_data(id)?;
        if !remote.contains_key(DATABASE_REQUEST_FIELD) {
            return Err(ProvideError::PrematureDataAccess(id));
        }
        Ok(remote)
    }

    /// Publish credentials to a client, echoing its request under `data`
    pub fn set_credentials(
        &self,
        id: RelationId,
        username: &str,
        password: &str,
    ) -> Result<(), ProvideError> {
        let request = self.request(id)?;
        self.model.relation_set_field(id, "username", username)?;
        self.model.relation_set_field(id, "password", password)?;
        self.model
            .relation_set_field(id, "data", &serde_json::to_string(&request)?)?;
        Ok(())
    }

    /// Publish the comma-joined endpoint list to a client
    pub fn set_endpoints(&self, id: RelationId, endpoints: &str) -> Result<(), ProvideError> {
        // Same handshake guard as `set_credentials`
        self.request(id)?;
        self.model.relation_set_field(id, "endpoints", endpoints)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DATABASE_INTEGRATION_NAME;
    use crate::juju::testing::FakeModel;

    #[test]
    fn test_set_credentials_before_request_is_premature() {
        let model = FakeModel::new().with_relation(RelationId(0), &[]);
        let database = DatabaseProvides::new(&model, DATABASE_INTEGRATION_NAME);

        let result = database.set_credentials(RelationId(0), "u", "p");
        assert!(matches!(
            result,
            Err(ProvideError::PrematureDataAccess(RelationId(0)))
        ));
        assert!(model.local_app_data(RelationId(0)).is_empty());
    }

    #[test]
    fn test_set_credentials_echoes_request_payload() {
        let model =
            FakeModel::new().with_relation(RelationId(2), &[("database", "inventory")]);
        let database = DatabaseProvides::new(&model, DATABASE_INTEGRATION_NAME);

        database
            .set_credentials(RelationId(2), "admin", "hunter2")
            .expect("request handshake is complete");
        database
            .set_endpoints(RelationId(2), "10.0.0.4:3306")
            .expect("request handshake is complete");

        let published = model.local_app_data(RelationId(2));
        assert_eq!(published.get("username").map(String::as_str), Some("admin"));
        assert_eq!(
            published.get("password").map(String::as_str),
            Some("hunter2")
        );
        assert_eq!(
            published.get("endpoints").map(String::as_str),
            Some("10.0.0.4:3306")
        );
        let echoed = published.get("data").expect("request payload echoed back");
        assert!(echoed.contains("\"database\":\"inventory\""));
    }

    #[test]
    fn test_unknown_relation_is_a_model_error() {
        let model = FakeModel::new();
        let database = DatabaseProvides::new(&model, DATABASE_INTEGRATION_NAME);

        let result = database.set_credentials(RelationId(9), "u", "p");
        assert!(matches!(
            result,
            Err(ProvideError::Model(ModelError::RelationNotFound(RelationId(9))))
        ));
    }
}
