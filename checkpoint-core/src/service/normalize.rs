//! Normalization of loosely shaped checkpoint payloads.
//!
//! Callers have historically sent several spellings for the same field. Each
//! canonical field is resolved from an ordered list of candidate keys; the
//! first key holding a non-empty string wins. File modifications are
//! validated strictly (one bad entry fails the whole save); todos, decisions
//! and artifacts are validated permissively (bad entries are dropped).

use serde_json::{Map, Value};

use crate::error::{CheckpointError, Result};
use crate::models::*;

type Object = Map<String, Value>;

/// Validate a checkpoint name and return it trimmed.
pub fn normalize_name(name: Option<&Value>) -> Result<String> {
    let name = name.ok_or_else(|| CheckpointError::validation("Checkpoint 'name' is required"))?;
    name.as_str().map_or_else(
        || Err(CheckpointError::validation("Checkpoint 'name' must be a non-empty string")),
        normalize_name_str,
    )
}

pub fn normalize_name_str(name: &str) -> Result<String> {
    match name.trim() {
        "" => Err(CheckpointError::validation(
            "Checkpoint 'name' must be a non-empty string",
        )),
        trimmed => Ok(trimmed.to_string()),
    }
}

/// Turn a raw `data` object into a checkpoint aggregate ready for the store.
pub fn normalize_checkpoint(data: &Value) -> Result<NewCheckpoint> {
    let data = data
        .as_object()
        .ok_or_else(|| CheckpointError::validation("Checkpoint data must be a JSON object"))?;

    let file_modifications = normalize_file_modifications(data)?;

    Ok(NewCheckpoint {
        fields: normalize_fields(data),
        todos: list(data, "todos").filter_map(normalize_todo).collect(),
        file_modifications,
        key_decisions: list(data, "key_decisions").filter_map(normalize_decision).collect(),
        artifacts: list(data, "artifacts").filter_map(normalize_artifact).collect(),
    })
}

/// Map a partial update object onto the fixed set of updatable fields.
/// Unknown keys are ignored; known keys must hold a string or null.
pub fn normalize_update(updates: &Value) -> Result<UpdateCheckpointInput> {
    let updates = updates
        .as_object()
        .ok_or_else(|| CheckpointError::validation("Updates must be a JSON object"))?;

    let field = |key: &str| -> Result<Option<Option<String>>> {
        match updates.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
            Some(_) => Err(CheckpointError::validation(format!(
                "Field '{key}' must be a string or null"
            ))),
        }
    };

    let input = UpdateCheckpointInput {
        summary: field("summary")?,
        current_goal: field("current_goal")?,
        working_directory: field("working_directory")?,
        git_branch: field("git_branch")?,
        git_status: field("git_status")?,
    };

    if input.is_empty() {
        return Err(CheckpointError::validation("No valid fields to update"));
    }
    Ok(input)
}

fn normalize_fields(data: &Object) -> CheckpointFields {
    let context = data.get("context").and_then(Value::as_object);
    let environment = |key: &str| {
        text(data, key).or_else(|| context.and_then(|ctx| text(ctx, key)))
    };

    CheckpointFields {
        summary: string(data, "summary"),
        current_goal: string(data, "current_goal"),
        working_directory: environment("working_directory"),
        git_branch: environment("git_branch"),
        git_status: environment("git_status"),
    }
}

fn normalize_todo(value: &Value) -> Option<NewTodo> {
    let Some(todo) = value.as_object() else {
        tracing::warn!("Dropping todo that is not an object");
        return None;
    };
    let Some(content) = first_text(todo, &["content", "title", "description"]) else {
        tracing::warn!("Dropping todo without content");
        return None;
    };

    let active_form =
        first_text(todo, &["activeForm", "active_form"]).unwrap_or_else(|| content.clone());
    let status = todo
        .get("status")
        .and_then(Value::as_str)
        .and_then(TodoStatus::from_str)
        .unwrap_or_default();

    Some(NewTodo {
        content,
        active_form,
        status,
    })
}

fn normalize_file_modifications(data: &Object) -> Result<Vec<NewFileModification>> {
    let files = nonempty_array(data, "file_modifications")
        .or_else(|| nonempty_array(data, "files_modified"))
        .map(Vec::as_slice)
        .unwrap_or_default();

    files
        .iter()
        .map(|value| {
            let file = value.as_object().ok_or_else(|| {
                CheckpointError::validation("Each file modification must be an object")
            })?;
            let file_path = text(file, "file_path").ok_or_else(|| {
                CheckpointError::validation("Each file modification must have 'file_path' field")
            })?;
            let modification_type = first_text(file, &["modification_type", "status"])
                .as_deref()
                .and_then(ModificationType::from_str)
                .unwrap_or_default();

            Ok(NewFileModification {
                file_path,
                modification_type,
                description: text(file, "description"),
            })
        })
        .collect()
}

fn normalize_decision(value: &Value) -> Option<NewKeyDecision> {
    let decision = value.as_object()?;
    let Some(decision_title) = first_text(decision, &["decision_title", "title"]) else {
        tracing::warn!("Dropping key decision without title");
        return None;
    };

    Some(NewKeyDecision {
        decision_title,
        decision_content: first_text(
            decision,
            &["decision_content", "rationale", "content", "description"],
        ),
    })
}

fn normalize_artifact(value: &Value) -> Option<NewArtifact> {
    let artifact = value.as_object()?;
    let Some(artifact_title) = first_text(artifact, &["artifact_title", "name", "title"]) else {
        tracing::warn!("Dropping artifact without title");
        return None;
    };

    Some(NewArtifact {
        artifact_title,
        artifact_content: first_text(artifact, &["artifact_content", "description", "content"]),
        artifact_type: first_text(artifact, &["artifact_type", "type"]),
    })
}

/// Entries of an array-valued key; anything else yields nothing.
fn list<'a>(data: &'a Object, key: &str) -> impl Iterator<Item = &'a Value> {
    data.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn nonempty_array<'a>(data: &'a Object, key: &str) -> Option<&'a Vec<Value>> {
    data.get(key)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

/// A string value stored as given, empty strings included.
fn string(object: &Object, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn text(object: &Object, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_text(object: &Object, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(object, key))
}
