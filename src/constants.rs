//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! Integration, secret, and status-message values are fixed by the charm's
//! metadata and its operator-facing contract; they are not configurable.

/// Name of the database integration this operator provides to clients
pub const DATABASE_INTEGRATION_NAME: &str = "database";

/// Label the database URI secret is resolved under
pub const DB_URI_SECRET_LABEL: &str = "mysql-proxy-db-uri";

/// Config option holding the database URI secret id; also the key the URI
/// text is stored under inside the secret content
pub const DB_URI_SECRET_KEY: &str = "db-uri";

/// Scheme the configured database URI must carry
pub const DB_URI_SCHEME: &str = "mysql";

/// Relation field a client sets to request a database; its presence marks
/// the request handshake as complete
pub const DATABASE_REQUEST_FIELD: &str = "database";

/// Blocked message shown while the database URI secret is not resolvable
pub const MSG_WAITING_FOR_DB_URI_SECRET: &str =
    "Waiting for `mysql-proxy-db-uri` secret to be configured";

/// Blocked message shown on non-leader units
pub const MSG_HA_NOT_SUPPORTED: &str =
    "MySQL proxy high-availability is not supported. Scale down application";

/// Blocked message shown when the database URI cannot be loaded or validated.
/// Detail goes to the log only; the operator-facing message stays generic.
pub const MSG_DB_URI_LOAD_FAILED: &str =
    "Failed to load database URI. See `juju debug-log` for details";
