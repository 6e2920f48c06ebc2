//! The checkpoint service: the five checkpoint operations on top of the
//! aggregate store.

mod normalize;

use serde_json::Value;

use crate::db::Database;
use crate::error::{CheckpointError, Result};
use crate::models::*;

pub use normalize::{normalize_checkpoint, normalize_name, normalize_name_str, normalize_update};

const SUCCESS: &str = "success";

#[derive(Clone)]
pub struct CheckpointService {
    db: Database,
}

impl CheckpointService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Save `data` under `name`, creating the checkpoint or replacing its
    /// scalar fields and every child collection.
    pub fn save(&self, name: &str, data: &Value) -> Result<SaveOutcome> {
        let name = normalize_name_str(name)?;
        self.save_normalized(&name, data)
    }

    /// Save a document that carries its own `name` key, as piped to
    /// `ckpt save`.
    pub fn save_document(&self, document: &Value) -> Result<SaveOutcome> {
        let object = document
            .as_object()
            .ok_or_else(|| CheckpointError::validation("Input must be a JSON object"))?;
        let name = normalize_name(object.get("name"))?;
        self.save_normalized(&name, document)
    }

    fn save_normalized(&self, name: &str, data: &Value) -> Result<SaveOutcome> {
        let checkpoint = normalize_checkpoint(data)?;
        let counts = checkpoint.counts();
        tracing::debug!("Saving checkpoint '{}' with {:?}", name, counts);

        let (checkpoint_id, action) = self.db.upsert_checkpoint(name, &checkpoint)?;

        Ok(SaveOutcome {
            status: SUCCESS.to_string(),
            message: format!("Checkpoint '{}' {} successfully", name, action.as_str()),
            action,
            checkpoint_id,
            counts,
        })
    }

    pub fn resume(&self, name: &str) -> Result<Checkpoint> {
        tracing::debug!("Resuming checkpoint '{}'", name);
        self.db
            .get_checkpoint(name)?
            .ok_or_else(|| CheckpointError::NotFound(name.to_string()))
    }

    /// The checkpoint as a YAML document, the compact form handed to agents.
    pub fn resume_yaml(&self, name: &str) -> Result<String> {
        let checkpoint = self.resume(name)?;
        Ok(serde_yaml::to_string(&checkpoint)?)
    }

    pub fn list(&self) -> Result<CheckpointList> {
        let checkpoints = self.db.list_checkpoints()?;
        tracing::debug!("Listed {} checkpoints", checkpoints.len());
        Ok(CheckpointList {
            status: SUCCESS.to_string(),
            count: checkpoints.len(),
            checkpoints,
        })
    }

    /// Update a subset of the scalar fields. Children are never touched.
    pub fn update(&self, name: &str, updates: &Value) -> Result<UpdateOutcome> {
        let input = normalize_update(updates)?;
        if !self.db.update_checkpoint(name, &input)? {
            return Err(CheckpointError::NotFound(name.to_string()));
        }

        Ok(UpdateOutcome {
            status: SUCCESS.to_string(),
            message: format!("Checkpoint '{}' updated successfully", name),
            updated_fields: input
                .updated_fields()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        if !self.db.delete_checkpoint(name)? {
            return Err(CheckpointError::NotFound(name.to_string()));
        }

        Ok(DeleteOutcome {
            status: SUCCESS.to_string(),
            message: format!("Checkpoint '{}' deleted successfully", name),
        })
    }
}
