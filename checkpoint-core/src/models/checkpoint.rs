use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Artifact, FileModification, KeyDecision, NewArtifact, NewFileModification, NewKeyDecision,
    NewTodo, Todo,
};

/// A checkpoint with its four ordered child collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub current_goal: Option<String>,
    pub working_directory: Option<String>,
    pub git_branch: Option<String>,
    pub git_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub todos: Vec<Todo>,
    pub file_modifications: Vec<FileModification>,
    pub key_decisions: Vec<KeyDecision>,
    pub artifacts: Vec<Artifact>,
}

impl Checkpoint {
    pub fn counts(&self) -> ChildCounts {
        ChildCounts {
            todos: self.todos.len(),
            file_modifications: self.file_modifications.len(),
            key_decisions: self.key_decisions.len(),
            artifacts: self.artifacts.len(),
        }
    }
}

/// The scalar columns of a checkpoint row that a save writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointFields {
    pub summary: Option<String>,
    pub current_goal: Option<String>,
    pub working_directory: Option<String>,
    pub git_branch: Option<String>,
    pub git_status: Option<String>,
}

/// A fully normalized checkpoint aggregate, as handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCheckpoint {
    pub fields: CheckpointFields,
    pub todos: Vec<NewTodo>,
    pub file_modifications: Vec<NewFileModification>,
    pub key_decisions: Vec<NewKeyDecision>,
    pub artifacts: Vec<NewArtifact>,
}

impl NewCheckpoint {
    pub fn counts(&self) -> ChildCounts {
        ChildCounts {
            todos: self.todos.len(),
            file_modifications: self.file_modifications.len(),
            key_decisions: self.key_decisions.len(),
            artifacts: self.artifacts.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCounts {
    pub todos: usize,
    pub file_modifications: usize,
    pub key_decisions: usize,
    pub artifacts: usize,
}

/// One row of the checkpoint listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub name: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub counts: ChildCounts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveAction {
    Created,
    Updated,
}

impl SaveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Partial update of the scalar fields. Each field is tri-state: `None`
/// leaves the column alone, `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCheckpointInput {
    pub summary: Option<Option<String>>,
    pub current_goal: Option<Option<String>>,
    pub working_directory: Option<Option<String>>,
    pub git_branch: Option<Option<String>>,
    pub git_status: Option<Option<String>>,
}

impl UpdateCheckpointInput {
    pub fn is_empty(&self) -> bool {
        self.updated_fields().is_empty()
    }

    /// Names of the fields this update touches, in column order.
    pub fn updated_fields(&self) -> Vec<&'static str> {
        [
            ("summary", self.summary.is_some()),
            ("current_goal", self.current_goal.is_some()),
            ("working_directory", self.working_directory.is_some()),
            ("git_branch", self.git_branch.is_some()),
            ("git_status", self.git_status.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub status: String,
    pub message: String,
    pub action: SaveAction,
    pub checkpoint_id: i64,
    pub counts: ChildCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointList {
    pub status: String,
    pub count: usize,
    pub checkpoints: Vec<CheckpointSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub status: String,
    pub message: String,
    pub updated_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub status: String,
    pub message: String,
}
