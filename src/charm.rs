//! # Charm Dispatch
//!
//! Lifecycle event handling for the MySQL proxy operator.
//!
//! Cross-cutting event policy — the leadership gate, the secret-exists
//! precondition, and the unconditional post-handler status refresh — is
//! expressed as composable wrappers: each takes a handler and returns a
//! handler, composed outer-to-inner as `leader(refresh(block_unless(body)))`.
//!
//! Handlers signal an intentional early stop with [`Interrupt::Stop`], a
//! typed value carrying the status to publish. It is caught exactly once, at
//! the [`refresh`] boundary; only [`Interrupt::Fatal`] escapes `dispatch`.

use tracing::{debug, error, info};

use crate::constants::{DB_URI_SECRET_LABEL, MSG_DB_URI_LOAD_FAILED, MSG_HA_NOT_SUPPORTED};
use crate::database::ProvideError;
use crate::juju::{Model, ModelError, RelationId, Status};
use crate::proxy::{self, LoadError};
use crate::state::{self, ConditionEvaluation};

/// Lifecycle trigger delivered by the Juju dispatch environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Install,
    ConfigChanged,
    SecretChanged { label: Option<String> },
    DatabaseRequested { relation: RelationId },
}

/// Control-flow signal raised out of a handler body.
///
/// `Stop` carries the status an intentionally aborted handler wants
/// published; `Fatal` is an unhandled store failure that fails the whole
/// event. Neither is used for success paths.
#[derive(Debug)]
pub enum Interrupt {
    Stop(Status),
    Fatal(anyhow::Error),
}

impl From<ModelError> for Interrupt {
    fn from(e: ModelError) -> Self {
        Interrupt::Fatal(e.into())
    }
}

impl From<ProvideError> for Interrupt {
    fn from(e: ProvideError) -> Self {
        Interrupt::Fatal(e.into())
    }
}

pub type HandlerResult = Result<(), Interrupt>;

/// A lifecycle handler, possibly already wrapped in policy layers
pub type Handler<'a, M> = Box<dyn FnOnce(&MySqlProxyCharm<M>) -> HandlerResult + 'a>;

/// Refresh the unit status after the wrapped handler completes.
///
/// On success the status is recomputed from scratch via
/// [`state::check_mysql_proxy`]; an [`Interrupt::Stop`] publishes the status
/// it carries instead. Either way the status surface never goes stale, even
/// when the handler body returned early.
pub fn refresh<'a, M: Model + 'a>(inner: Handler<'a, M>) -> Handler<'a, M> {
    Box::new(move |charm| match inner(charm) {
        Ok(()) => {
            let status = state::check_mysql_proxy(charm.model());
            charm.model().set_unit_status(&status)?;
            Ok(())
        }
        Err(Interrupt::Stop(status)) => {
            charm.model().set_unit_status(&status)?;
            Ok(())
        }
        fatal => fatal,
    })
}

/// Run the wrapped handler only on the leader unit.
///
/// Non-leader units no-op entirely: no side effect, no status change.
pub fn leader<'a, M: Model + 'a>(inner: Handler<'a, M>) -> Handler<'a, M> {
    Box::new(move |charm| {
        if !charm.model().is_leader()? {
            debug!("unit is not the leader; skipping handler");
            return Ok(());
        }
        inner(charm)
    })
}

/// Stop with a Blocked status unless the condition holds
pub fn block_unless<'a, M, F>(condition: F, inner: Handler<'a, M>) -> Handler<'a, M>
where
    M: Model + 'a,
    F: FnOnce(&M) -> ConditionEvaluation + 'a,
{
    Box::new(move |charm| {
        let evaluation = condition(charm.model());
        if !evaluation.ok {
            return Err(Interrupt::Stop(Status::Blocked(evaluation.message)));
        }
        inner(charm)
    })
}

/// Charmed operator for proxying uncharmed MySQL databases to charmed
/// applications
#[derive(Debug)]
pub struct MySqlProxyCharm<M: Model> {
    model: M,
}

impl<M: Model> MySqlProxyCharm<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Route one lifecycle event through its gated handler
    pub fn dispatch(&self, event: Event) -> anyhow::Result<()> {
        if let Event::SecretChanged { label } = &event {
            // Changes to secrets other than the database URI are not ours
            if label.as_deref() != Some(DB_URI_SECRET_LABEL) {
                debug!(?label, "ignoring change to unrelated secret");
                return Ok(());
            }
        }

        info!(?event, "handling lifecycle event");
        let handler: Handler<'_, M> = match event {
            Event::Install => refresh(Box::new(Self::handle_install)),
            Event::ConfigChanged | Event::SecretChanged { .. } => leader(refresh(block_unless(
                state::db_uri_secret_exists,
                Box::new(|charm: &Self| charm.update_database_data(None)),
            ))),
            Event::DatabaseRequested { relation } => leader(refresh(block_unless(
                state::db_uri_secret_exists,
                Box::new(move |charm: &Self| charm.update_database_data(Some(relation))),
            ))),
        };

        match handler(self) {
            Ok(()) | Err(Interrupt::Stop(_)) => Ok(()),
            Err(Interrupt::Fatal(e)) => Err(e),
        }
    }

    /// Handle when the charm is installed.
    ///
    /// Only the leader unit may run the proxy; additional units block
    /// permanently until the application is scaled back down.
    fn handle_install(&self) -> HandlerResult {
        if !self.model.is_leader()? {
            return Err(Interrupt::Stop(Status::Blocked(
                MSG_HA_NOT_SUPPORTED.to_string(),
            )));
        }
        Ok(())
    }

    /// Load the database URI and republish it, to one relation or all.
    ///
    /// Load failures keep the detail in the log and block with a generic
    /// message; store failures fail the event.
    fn update_database_data(&self, integration_id: Option<RelationId>) -> HandlerResult {
        let data = match proxy::load_database_data(&self.model) {
            Ok(data) => data,
            Err(LoadError::Model(e)) => return Err(Interrupt::Fatal(e.into())),
            Err(e) => {
                error!("{e}");
                return Err(Interrupt::Stop(Status::Blocked(
                    MSG_DB_URI_LOAD_FAILED.to_string(),
                )));
            }
        };

        proxy::set_database_data(&self.model, &data, integration_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::juju::testing::FakeModel;

    #[test]
    fn test_refresh_publishes_recomputed_status_on_success() {
        let model = FakeModel::new().with_leader(true);
        let charm = MySqlProxyCharm::new(model);

        let handler = refresh::<FakeModel>(Box::new(|_| Ok(())));
        handler(&charm).expect("refresh succeeds");

        // No secret configured, so the recomputed status is Blocked
        assert!(matches!(
            charm.model().current_status(),
            Some(Status::Blocked(_))
        ));
    }

    #[test]
    fn test_refresh_publishes_the_carried_status_on_stop() {
        let model = FakeModel::new().with_leader(true);
        let charm = MySqlProxyCharm::new(model);

        let handler = refresh::<FakeModel>(Box::new(|_| {
            Err(Interrupt::Stop(Status::Blocked("custom".to_string())))
        }));
        handler(&charm).expect("stop is absorbed by refresh");

        assert_eq!(
            charm.model().current_status(),
            Some(Status::Blocked("custom".to_string()))
        );
    }

    #[test]
    fn test_leader_gate_skips_inner_and_refresh() {
        let model = FakeModel::new().with_leader(false);
        let charm = MySqlProxyCharm::new(model);

        let handler = leader(refresh::<FakeModel>(Box::new(|_| {
            panic!("inner handler must not run on a non-leader")
        })));
        handler(&charm).expect("non-leader no-op");

        assert!(charm.model().status_log().is_empty());
    }

    #[test]
    fn test_block_unless_stops_with_the_condition_message() {
        let model = FakeModel::new().with_leader(true);
        let charm = MySqlProxyCharm::new(model);

        let handler = block_unless::<FakeModel, _>(
            |_| ConditionEvaluation::fails("not ready"),
            Box::new(|_| panic!("inner handler must not run")),
        );
        let result = handler(&charm);
        assert!(matches!(
            result,
            Err(Interrupt::Stop(Status::Blocked(message))) if message == "not ready"
        ));
    }
}
