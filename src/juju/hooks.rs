//! # Hook Tool Model
//!
//! Production [`Model`] implementation backed by the Juju hook tools.
//!
//! Each accessor shells out to the corresponding tool (`is-leader`,
//! `config-get`, `secret-get`, `relation-ids`, ...) with `--format=json` and
//! parses the output with `serde_json`. The tools are only on `PATH` inside a
//! hook invocation; constructing a [`HookModel`] outside one is fine, using
//! it is not.

use std::collections::BTreeMap;
use std::process::Command;

use serde::de::DeserializeOwned;
use tracing::trace;

use super::{Model, ModelError, RelationId, SecretRef, Status};

/// [`Model`] backed by the Juju hook environment
#[derive(Debug, Default, Clone, Copy)]
pub struct HookModel;

impl HookModel {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run a hook tool and return its stdout
    fn run(&self, tool: &str, args: &[&str]) -> Result<String, ModelError> {
        trace!(tool, ?args, "running hook tool");
        let output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|e| ModelError::Tool {
                tool: tool.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(tool, message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a hook tool with `--format=json` and deserialize its output
    fn run_json<T: DeserializeOwned>(&self, tool: &str, args: &[&str]) -> Result<T, ModelError> {
        let mut args = args.to_vec();
        args.push("--format=json");
        let stdout = self.run(tool, &args)?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

/// Map a failed tool invocation onto the error taxonomy.
///
/// The hook tools only communicate failure modes through exit status and
/// stderr text, so recoverable secret failures are recognized by message.
fn classify_failure(tool: &str, message: String) -> ModelError {
    let lowered = message.to_lowercase();
    if tool.starts_with("secret-") {
        if lowered.contains("not found") {
            return ModelError::SecretNotFound(message);
        }
        if lowered.contains("permission denied") || lowered.contains("access") {
            return ModelError::PermissionDenied(message);
        }
    }

    ModelError::Tool {
        tool: tool.to_string(),
        message,
    }
}

/// Build the id/label argument list shared by the secret tools
fn secret_args<'a>(id: Option<&'a str>, label: &'a str) -> Vec<&'a str> {
    let mut args = Vec::new();
    if let Some(id) = id {
        args.push(id);
    }
    args.push("--label");
    args.push(label);
    args
}

impl Model for HookModel {
    fn model_name(&self) -> String {
        std::env::var("JUJU_MODEL_NAME").unwrap_or_default()
    }

    fn is_leader(&self) -> Result<bool, ModelError> {
        self.run_json("is-leader", &[])
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, ModelError> {
        // `config-get` prints nothing for an unset option
        let stdout = self.run("config-get", &[key, "--format=json"])?;
        if stdout.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    fn get_secret(&self, id: Option<&str>, label: &str) -> Result<SecretRef, ModelError> {
        // `--peek` resolves and reads the latest revision without moving the
        // unit's tracked revision; used here purely as an existence check
        let mut args = secret_args(id, label);
        args.push("--peek");
        let _content: BTreeMap<String, String> = self.run_json("secret-get", &args)?;

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
        let mut args = secret_args(secret.id.as_deref(), &secret.label);
        if refresh {
            args.push("--refresh");
        }
        self.run_json("secret-get", &args)
    }

    fn relation_ids(&self, integration: &str) -> Result<Vec<RelationId>, ModelError> {
        // Output is a list of qualified ids, e.g. ["database:0", "database:3"]
        let qualified: Vec<String> = self.run_json("relation-ids", &[integration])?;
        let mut ids = Vec::with_capacity(qualified.len());
        for entry in qualified {
            let id = entry
                .rsplit(':')
                .next()
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| ModelError::Tool {
                    tool: "relation-ids".to_string(),
                    message: format!("unparseable relation id '{entry}'"),
                })?;
            ids.push(RelationId(id));
        }
        Ok(ids)
    }

    fn remote_app_data(&self, id: RelationId) -> Result<BTreeMap<String, String>, ModelError> {
        let rid = id.to_string();
        let remote_app: String = self.run_json("relation-list", &["-r", &rid, "--app"])?;
        self.run_json("relation-get", &["-r", &rid, "-", &remote_app, "--app"])
            .map_err(|e| match e {
                ModelError::Tool { message, .. } if message.to_lowercase().contains("not found") => {
                    ModelError::RelationNotFound(id)
                }
                other => other,
            })
    }

    fn relation_set_field(
        &self,
        id: RelationId,
        key: &str,
        value: &str,
    ) -> Result<(), ModelError> {
        let rid = id.to_string();
        let pair = format!("{key}={value}");
        self.run("relation-set", &["-r", &rid, "--app", &pair])
            .map(|_| ())
            .map_err(|e| match e {
                ModelError::Tool { message, .. } if message.to_lowercase().contains("not found") => {
                    ModelError::RelationNotFound(id)
                }
                other => other,
            })
    }

    fn set_unit_status(&self, status: &Status) -> Result<(), ModelError> {
        self.run("status-set", &[status.name(), status.message()])
            .map(|_| ())
    }
}
