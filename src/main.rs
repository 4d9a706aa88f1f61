//! # MySQL Proxy Dispatch Binary
//!
//! Entry point Juju invokes for every lifecycle hook. The hook name comes
//! from the positional argument or, under `dispatch`, from
//! `JUJU_DISPATCH_PATH`; event details (secret label, relation id) come from
//! the hook environment. Hooks this operator does not observe exit 0 with no
//! side effects.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use mysql_proxy::charm::Event;
use mysql_proxy::juju::{HookModel, RelationId};
use mysql_proxy::MySqlProxyCharm;

/// MySQL proxy charm dispatcher
#[derive(Debug, Parser)]
#[command(name = "mysql-proxy")]
#[command(about = "Dispatch a Juju lifecycle hook for the MySQL proxy operator", long_about = None)]
struct Cli {
    /// Hook name to dispatch; defaults to the basename of JUJU_DISPATCH_PATH
    hook: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mysql_proxy=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let hook = cli
        .hook
        .or_else(hook_from_environment)
        .context("no hook name given and JUJU_DISPATCH_PATH is not set")?;

    info!(
        hook,
        build = env!("BUILD_GIT_HASH"),
        built = env!("BUILD_DATETIME"),
        "dispatching mysql proxy hook"
    );

    let charm = MySqlProxyCharm::new(HookModel::new());
    match event_for_hook(&hook)? {
        Some(event) => charm.dispatch(event),
        None => {
            debug!(hook, "no handler observes this hook");
            Ok(())
        }
    }
}

/// Resolve the hook name from the Juju dispatch environment
fn hook_from_environment() -> Option<String> {
    let path = std::env::var("JUJU_DISPATCH_PATH")
        .or_else(|_| std::env::var("JUJU_HOOK_NAME"))
        .ok()?;
    let name = path.rsplit('/').next().unwrap_or(&path);
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// Map a hook name onto the charm's observed events.
///
/// `Ok(None)` marks a hook this operator deliberately ignores.
fn event_for_hook(hook: &str) -> Result<Option<Event>> {
    let event = match hook {
        "install" => Some(Event::Install),
        "config-changed" => Some(Event::ConfigChanged),
        "secret-changed" => Some(Event::SecretChanged {
            label: std::env::var("JUJU_SECRET_LABEL").ok(),
        }),
        // Clients request a database by writing their relation data, which
        // arrives here as a relation-changed hook on the database integration
        "database-relation-changed" => Some(Event::DatabaseRequested {
            relation: relation_id_from_environment()?,
        }),
        _ => None,
    };
    Ok(event)
}

/// Parse the triggering relation id from `JUJU_RELATION_ID` (`database:0`)
fn relation_id_from_environment() -> Result<RelationId> {
    let raw = std::env::var("JUJU_RELATION_ID")
        .context("JUJU_RELATION_ID is not set for a relation hook")?;
    let id = raw
        .rsplit(':')
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .with_context(|| format!("unparseable relation id '{raw}'"))?;
    Ok(RelationId(id))
}
