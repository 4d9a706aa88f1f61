//! MySQL Proxy Operator Library
//!
//! Reconciliation logic for a Juju operator that proxies an uncharmed MySQL
//! database: it reads a `mysql://` connection URI from a Juju secret,
//! validates it, and republishes the credentials and endpoint to integrated
//! client applications.
//!
//! The operator never connects to the proxied database itself. On every
//! lifecycle event it recomputes unit status from scratch (Active when the
//! URI secret resolves, Blocked otherwise) and, on the leader unit only,
//! pushes the current credentials into every client relation that has
//! completed its database request handshake.
//!
//! Tests live in the module files and in `tests/`.

pub mod charm;
pub mod constants;
pub mod database;
pub mod juju;
pub mod proxy;
pub mod state;

pub use charm::{Event, MySqlProxyCharm};
pub use juju::{HookModel, Model, ModelError, RelationId, Status};
pub use proxy::{DatabaseProxyData, LoadError, ValidationError};
