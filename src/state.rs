//! # Operator State
//!
//! Condition checks and the status evaluator for the MySQL proxy unit.
//!
//! Status is never persisted between events; it is recomputed from the
//! current model state on every trigger.

use crate::constants::{DB_URI_SECRET_KEY, DB_URI_SECRET_LABEL, MSG_WAITING_FOR_DB_URI_SECRET};
use crate::juju::{Model, Status};

/// Outcome of a guard condition: whether it holds, and the Blocked message
/// to surface when it does not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionEvaluation {
    pub ok: bool,
    pub message: String,
}

impl ConditionEvaluation {
    #[must_use]
    pub fn holds() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn fails(message: &str) -> Self {
        Self {
            ok: false,
            message: message.to_string(),
        }
    }
}

/// Check if the database URI secret resolves.
///
/// Any model failure while resolving — missing secret, access not granted,
/// store errors — counts as "does not exist"; the next triggering event
/// re-evaluates from scratch.
pub fn db_uri_secret_exists<M: Model>(model: &M) -> ConditionEvaluation {
    let secret_id = model.config_value(DB_URI_SECRET_KEY).ok().flatten();
    if model
        .get_secret(secret_id.as_deref(), DB_URI_SECRET_LABEL)
        .is_ok()
    {
        ConditionEvaluation::holds()
    } else {
        ConditionEvaluation::fails(MSG_WAITING_FOR_DB_URI_SECRET)
    }
}

/// Determine the state of the MySQL proxy unit from satisfied conditions
pub fn check_mysql_proxy<M: Model>(model: &M) -> Status {
    let evaluation = db_uri_secret_exists(model);
    if !evaluation.ok {
        return Status::Blocked(evaluation.message);
    }

    Status::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::juju::testing::FakeModel;

    #[test]
    fn test_missing_secret_blocks() {
        let model = FakeModel::new();
        assert_eq!(
            check_mysql_proxy(&model),
            Status::Blocked(MSG_WAITING_FOR_DB_URI_SECRET.to_string())
        );
    }

    #[test]
    fn test_ungranted_secret_blocks() {
        let model = FakeModel::new()
            .with_config(DB_URI_SECRET_KEY, "secret:abc123")
            .with_ungranted_secret("secret:abc123", DB_URI_SECRET_LABEL);
        assert!(!db_uri_secret_exists(&model).ok);
    }

    #[test]
    fn test_resolvable_secret_is_active() {
        let model = FakeModel::new().with_secret(
            "secret:abc123",
            DB_URI_SECRET_LABEL,
            DB_URI_SECRET_KEY,
            "mysql://u:p@h:3306",
        );
        assert_eq!(check_mysql_proxy(&model), Status::Active);
    }
}
