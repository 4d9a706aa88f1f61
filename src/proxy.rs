//! # MySQL Proxy Operations
//!
//! The reconciliation core: load the proxied database's connection data from
//! the configured Juju secret, validate it, and republish it to integrated
//! clients.
//!
//! No connection is ever made to the proxied MySQL server; this module only
//! moves already-validated connection parameters between the secret store
//! and the relation store.

use std::fmt;

use thiserror::Error;
use tracing::debug;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    DATABASE_INTEGRATION_NAME, DB_URI_SCHEME, DB_URI_SECRET_KEY, DB_URI_SECRET_LABEL,
};
use crate::database::{DatabaseProvides, ProvideError};
use crate::juju::{Model, ModelError, RelationId};

/// Database info extracted from the configured database URI.
///
/// Constructed fresh from the secret on every triggering event and discarded
/// after publishing; never cached across events. The password is redacted
/// from `Debug` output and the backing memory is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DatabaseProxyData {
    /// Username to use when accessing the proxied database
    pub username: String,
    /// Password to use when accessing the proxied database
    pub password: String,
    /// Endpoints that can be used to access the proxied database
    pub endpoints: Vec<String>,
}

impl fmt::Debug for DatabaseProxyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseProxyData")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Structural defect in a database URI
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required component(s) in database uri: {}", .0.join(", "))]
    MissingComponents(Vec<&'static str>),
    #[error("invalid scheme '{0}'. only the 'mysql' scheme is supported")]
    UnsupportedScheme(String),
}

/// Error type for loading the proxied database data
///
/// `SecretUnavailable` and `InvalidUri` are recoverable by operator action
/// and convert to a Blocked status at the handler boundary; `Model` wraps
/// any other store failure and propagates fatally.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "cannot access configured database uri. ensure that the database uri secret \
         exists and model '{model}' has been granted access to the secret"
    )]
    SecretUnavailable { model: String },
    #[error("invalid database uri: {0}")]
    InvalidUri(String),
    #[error(transparent)]
    Model(ModelError),
}

/// Validate a proxied MySQL database URI.
///
/// Missing components are collected rather than short-circuited so the
/// operator sees every defect at once; the scheme is only checked when all
/// components are present.
pub fn validate_database_uri(uri: &Url) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if uri.username().is_empty() {
        missing.push("username");
    }
    if uri.password().is_none_or(str::is_empty) {
        missing.push("password");
    }
    if uri.host_str().is_none_or(str::is_empty) {
        missing.push("hostname");
    }
    if uri.port().is_none() {
        missing.push("port");
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingComponents(missing));
    }

    if uri.scheme() != DB_URI_SCHEME {
        return Err(ValidationError::UnsupportedScheme(uri.scheme().to_string()));
    }

    Ok(())
}

/// Load proxied MySQL database data from the configured Juju secret.
///
/// Resolves the secret by the `db-uri` config option and the fixed
/// `mysql-proxy-db-uri` label, force-refreshes its content (the secret may
/// rotate underneath the tracked revision), and validates the URI before
/// constructing [`DatabaseProxyData`]. Idempotent; safe to call on every
/// event.
pub fn load_database_data<M: Model>(model: &M) -> Result<DatabaseProxyData, LoadError> {
    let secret_id = model.config_value(DB_URI_SECRET_KEY).map_err(LoadError::Model)?;
    let secret = match model.get_secret(secret_id.as_deref(), DB_URI_SECRET_LABEL) {
        Ok(secret) => secret,
        Err(e) => {
            debug!("database uri secret did not resolve: {e}");
            return Err(LoadError::SecretUnavailable {
                model: model.model_name(),
            });
        }
    };

    let content = model.secret_content(&secret, true).map_err(LoadError::Model)?;
    let raw = content
        .get(DB_URI_SECRET_KEY)
        .ok_or_else(|| {
            LoadError::InvalidUri(format!(
                "secret content is missing the '{DB_URI_SECRET_KEY}' field"
            ))
        })?;

    let uri = Url::parse(raw).map_err(|e| LoadError::InvalidUri(e.to_string()))?;
    validate_database_uri(&uri).map_err(|e| LoadError::InvalidUri(e.to_string()))?;

    // Validation guarantees host and port are present
    let hostname = uri.host_str().unwrap_or_default();
    let port = uri.port().unwrap_or_default();

    Ok(DatabaseProxyData {
        username: uri.username().to_string(),
        password: uri.password().unwrap_or_default().to_string(),
        endpoints: vec![format!("{hostname}:{port}")],
    })
}

/// Publish proxied database data to integrated MySQL clients.
///
/// With `integration_id` set, only that relation is updated; otherwise every
/// joined relation of the `database` integration is. Clients that have not
/// requested a database yet are skipped silently — attempting the write and
/// ignoring the handshake error is simpler than pre-checking readiness per
/// relation on every event. All other store errors propagate unchanged.
pub fn set_database_data<M: Model>(
    model: &M,
    data: &DatabaseProxyData,
    integration_id: Option<RelationId>,
) -> Result<(), ProvideError> {
    let database = DatabaseProvides::new(model, DATABASE_INTEGRATION_NAME);
    let targets = match integration_id {
        Some(id) => vec![id],
        None => database.relations()?,
    };

    let endpoints = data.endpoints.join(",");
    for id in targets {
        let result = database
            .set_credentials(id, &data.username, &data.password)
            .and_then(|()| database.set_endpoints(id, &endpoints));
        match result {
            Ok(()) => {}
            Err(ProvideError::PrematureDataAccess(id)) => {
                debug!(relation = %id, "database not requested yet; skipping data update");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::juju::testing::FakeModel;

    fn parse(uri: &str) -> Url {
        Url::parse(uri).expect("test uri parses")
    }

    #[test]
    fn test_validate_accepts_complete_mysql_uri() {
        assert_eq!(
            validate_database_uri(&parse("mysql://u:p@h:5432")),
            Ok(())
        );
    }

    #[test]
    fn test_validate_collects_missing_components_in_order() {
        let cases = [
            ("mysql://u:p@h", vec!["port"]),
            ("mysql://u@h:3306", vec!["password"]),
            ("mysql://:p@h:3306", vec!["username"]),
            ("mysql://h:3306", vec!["username", "password"]),
        ];
        for (uri, expected) in cases {
            assert_eq!(
                validate_database_uri(&parse(uri)),
                Err(ValidationError::MissingComponents(expected)),
                "uri: {uri}"
            );
        }
    }

    #[test]
    fn test_validate_reports_all_four_components() {
        let err = validate_database_uri(&parse("mysql:nothing-here")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required component(s) in database uri: username, password, hostname, port"
        );
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        let err = validate_database_uri(&parse("postgres://u:p@h:5432")).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedScheme("postgres".to_string()));
        assert_eq!(
            err.to_string(),
            "invalid scheme 'postgres'. only the 'mysql' scheme is supported"
        );
    }

    #[test]
    fn test_missing_components_win_over_bad_scheme() {
        // Both defects present; the missing-component report takes precedence
        let err = validate_database_uri(&parse("postgres://u:p@h")).unwrap_err();
        assert_eq!(err, ValidationError::MissingComponents(vec!["port"]));
    }

    #[test]
    fn test_load_round_trips_a_well_formed_uri() {
        let model = FakeModel::new()
            .with_config(DB_URI_SECRET_KEY, "secret:abc123")
            .with_secret(
                "secret:abc123",
                DB_URI_SECRET_LABEL,
                DB_URI_SECRET_KEY,
                "mysql://u:p@h:5432",
            );

        let data = load_database_data(&model).expect("uri is valid");
        assert_eq!(data.username, "u");
        assert_eq!(data.password, "p");
        assert_eq!(data.endpoints, vec!["h:5432".to_string()]);
    }

    #[test]
    fn test_load_forces_a_refreshed_secret_read() {
        let model = FakeModel::new().with_secret(
            "secret:abc123",
            DB_URI_SECRET_LABEL,
            DB_URI_SECRET_KEY,
            "mysql://u:p@h:5432",
        );

        load_database_data(&model).expect("uri is valid");
        assert_eq!(model.refreshed_reads(), 1);
    }

    #[test]
    fn test_load_without_secret_is_unavailable() {
        let model = FakeModel::new();
        let err = load_database_data(&model).unwrap_err();
        assert!(matches!(err, LoadError::SecretUnavailable { .. }));
        assert!(err.to_string().contains("model 'testing'"));
    }

    #[test]
    fn test_load_without_grant_is_unavailable() {
        let model = FakeModel::new()
            .with_config(DB_URI_SECRET_KEY, "secret:abc123")
            .with_ungranted_secret("secret:abc123", DB_URI_SECRET_LABEL);

        let err = load_database_data(&model).unwrap_err();
        assert!(matches!(err, LoadError::SecretUnavailable { .. }));
    }

    #[test]
    fn test_load_surfaces_validation_detail() {
        let model = FakeModel::new().with_secret(
            "secret:abc123",
            DB_URI_SECRET_LABEL,
            DB_URI_SECRET_KEY,
            "postgres://u:p@h:5432",
        );

        let err = load_database_data(&model).unwrap_err();
        assert!(err.to_string().contains("invalid scheme 'postgres'"));
    }

    #[test]
    fn test_load_rejects_secret_missing_the_uri_field() {
        let model = FakeModel::new().with_secret(
            "secret:abc123",
            DB_URI_SECRET_LABEL,
            "unrelated-key",
            "mysql://u:p@h:5432",
        );

        let err = load_database_data(&model).unwrap_err();
        assert!(matches!(err, LoadError::InvalidUri(_)));
    }

    #[test]
    fn test_debug_never_exposes_the_password() {
        let data = DatabaseProxyData {
            username: "u".to_string(),
            password: "p".to_string(),
            endpoints: vec!["h:5432".to_string()],
        };
        let rendered = format!("{data:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("password: \"p\""));
    }
}
