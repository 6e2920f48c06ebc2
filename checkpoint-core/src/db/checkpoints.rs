use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::{format_timestamp, parse_timestamp, Database};
use crate::error::{CheckpointError, Result};
use crate::models::*;

const CHILD_TABLES: [&str; 4] = ["todos", "file_modifications", "key_decisions", "artifacts"];

/// Raw `checkpoints` row before timestamp parsing.
struct CheckpointRow {
    id: i64,
    name: String,
    summary: Option<String>,
    current_goal: Option<String>,
    working_directory: Option<String>,
    git_branch: Option<String>,
    git_status: Option<String>,
    created_at: String,
    updated_at: String,
}

impl Database {
    /// Create or replace the checkpoint called `name` in one IMMEDIATE
    /// transaction.
    ///
    /// A new name inserts the parent row. An existing name updates the scalar
    /// fields and `updated_at` (never `created_at`) and replaces every child
    /// row wholesale. Any failure rolls the whole aggregate back.
    pub fn upsert_checkpoint(&self, name: &str, input: &NewCheckpoint) -> Result<(i64, SaveAction)> {
        self.with_connection(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = format_timestamp(Utc::now());
            let fields = &input.fields;

            let existing: Option<i64> = tx
                .query_row("SELECT id FROM checkpoints WHERE name = ?1", [name], |row| row.get(0))
                .optional()?;

            let (checkpoint_id, action) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE checkpoints
                         SET summary = ?1, current_goal = ?2, working_directory = ?3,
                             git_branch = ?4, git_status = ?5, updated_at = ?6
                         WHERE id = ?7",
                        params![
                            fields.summary,
                            fields.current_goal,
                            fields.working_directory,
                            fields.git_branch,
                            fields.git_status,
                            now,
                            id,
                        ],
                    )?;
                    for table in CHILD_TABLES {
                        tx.execute(&format!("DELETE FROM {table} WHERE checkpoint_id = ?1"), [id])?;
                    }
                    (id, SaveAction::Updated)
                }
                None => {
                    tx.execute(
                        "INSERT INTO checkpoints
                         (name, summary, current_goal, working_directory, git_branch, git_status, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                        params![
                            name,
                            fields.summary,
                            fields.current_goal,
                            fields.working_directory,
                            fields.git_branch,
                            fields.git_status,
                            now,
                        ],
                    )?;
                    (tx.last_insert_rowid(), SaveAction::Created)
                }
            };

            insert_children(&tx, checkpoint_id, input)?;
            tx.commit()?;

            tracing::info!(
                "Checkpoint '{}' {} (id: {})",
                name,
                action.as_str(),
                checkpoint_id
            );
            Ok((checkpoint_id, action))
        })
    }

    /// Load a checkpoint and its children, each in original insertion order.
    pub fn get_checkpoint(&self, name: &str) -> Result<Option<Checkpoint>> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let row = tx
                .query_row(
                    "SELECT id, name, summary, current_goal, working_directory, git_branch,
                            git_status, created_at, updated_at
                     FROM checkpoints WHERE name = ?1",
                    [name],
                    |row| {
                        Ok(CheckpointRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            summary: row.get(2)?,
                            current_goal: row.get(3)?,
                            working_directory: row.get(4)?,
                            git_branch: row.get(5)?,
                            git_status: row.get(6)?,
                            created_at: row.get(7)?,
                            updated_at: row.get(8)?,
                        })
                    },
                )
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            let checkpoint = Checkpoint {
                id: row.id,
                todos: load_todos(&tx, row.id)?,
                file_modifications: load_file_modifications(&tx, row.id)?,
                key_decisions: load_key_decisions(&tx, row.id)?,
                artifacts: load_artifacts(&tx, row.id)?,
                name: row.name,
                summary: row.summary,
                current_goal: row.current_goal,
                working_directory: row.working_directory,
                git_branch: row.git_branch,
                git_status: row.git_status,
                created_at: parse_timestamp(&row.created_at)?,
                updated_at: parse_timestamp(&row.updated_at)?,
            };
            Ok(Some(checkpoint))
        })
    }

    /// All checkpoints, most recently updated first, with child counts.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.name, c.summary, c.created_at, c.updated_at,
                        (SELECT COUNT(*) FROM todos t WHERE t.checkpoint_id = c.id),
                        (SELECT COUNT(*) FROM file_modifications f WHERE f.checkpoint_id = c.id),
                        (SELECT COUNT(*) FROM key_decisions d WHERE d.checkpoint_id = c.id),
                        (SELECT COUNT(*) FROM artifacts a WHERE a.checkpoint_id = c.id)
                 FROM checkpoints c
                 ORDER BY c.updated_at DESC, c.id ASC",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    ChildCounts {
                        todos: row.get(4)?,
                        file_modifications: row.get(5)?,
                        key_decisions: row.get(6)?,
                        artifacts: row.get(7)?,
                    },
                ))
            })?;

            let mut summaries = Vec::new();
            for row in rows {
                let (name, summary, created_at, updated_at, counts) = row?;
                summaries.push(CheckpointSummary {
                    name,
                    summary,
                    created_at: parse_timestamp(&created_at)?,
                    updated_at: parse_timestamp(&updated_at)?,
                    counts,
                });
            }
            Ok(summaries)
        })
    }

    /// Delete a checkpoint; the schema cascades to its children. Returns
    /// `false` when no checkpoint has that name.
    pub fn delete_checkpoint(&self, name: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM checkpoints WHERE name = ?1", [name])?;
            if deleted > 0 {
                tracing::info!("Checkpoint '{}' deleted", name);
            }
            Ok(deleted > 0)
        })
    }

    /// Update only the scalar fields present in `input` and refresh
    /// `updated_at`. Returns `false` when no checkpoint has that name.
    pub fn update_checkpoint(&self, name: &str, input: &UpdateCheckpointInput) -> Result<bool> {
        if input.is_empty() {
            return Err(CheckpointError::validation("No valid fields to update"));
        }

        self.with_connection(|conn| {
            let now = format_timestamp(Utc::now());
            let updated = conn.execute(
                "UPDATE checkpoints SET
                     summary = CASE WHEN ?1 THEN ?2 ELSE summary END,
                     current_goal = CASE WHEN ?3 THEN ?4 ELSE current_goal END,
                     working_directory = CASE WHEN ?5 THEN ?6 ELSE working_directory END,
                     git_branch = CASE WHEN ?7 THEN ?8 ELSE git_branch END,
                     git_status = CASE WHEN ?9 THEN ?10 ELSE git_status END,
                     updated_at = ?11
                 WHERE name = ?12",
                params![
                    input.summary.is_some(),
                    input.summary.clone().flatten(),
                    input.current_goal.is_some(),
                    input.current_goal.clone().flatten(),
                    input.working_directory.is_some(),
                    input.working_directory.clone().flatten(),
                    input.git_branch.is_some(),
                    input.git_branch.clone().flatten(),
                    input.git_status.is_some(),
                    input.git_status.clone().flatten(),
                    now,
                    name,
                ],
            )?;
            if updated > 0 {
                tracing::info!("Checkpoint '{}' fields updated: {:?}", name, input.updated_fields());
            }
            Ok(updated > 0)
        })
    }
}

fn insert_children(tx: &Transaction<'_>, checkpoint_id: i64, input: &NewCheckpoint) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO todos (checkpoint_id, content, active_form, status, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (index, todo) in input.todos.iter().enumerate() {
        stmt.execute(params![
            checkpoint_id,
            todo.content,
            todo.active_form,
            todo.status.as_str(),
            index as i64,
        ])?;
    }

    let mut stmt = tx.prepare(
        "INSERT INTO file_modifications (checkpoint_id, file_path, modification_type, description)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for file in &input.file_modifications {
        stmt.execute(params![
            checkpoint_id,
            file.file_path,
            file.modification_type.as_str(),
            file.description,
        ])?;
    }

    let mut stmt = tx.prepare(
        "INSERT INTO key_decisions (checkpoint_id, decision_title, decision_content, order_index)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (index, decision) in input.key_decisions.iter().enumerate() {
        stmt.execute(params![
            checkpoint_id,
            decision.decision_title,
            decision.decision_content,
            index as i64,
        ])?;
    }

    let mut stmt = tx.prepare(
        "INSERT INTO artifacts (checkpoint_id, artifact_title, artifact_content, artifact_type, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (index, artifact) in input.artifacts.iter().enumerate() {
        stmt.execute(params![
            checkpoint_id,
            artifact.artifact_title,
            artifact.artifact_content,
            artifact.artifact_type,
            index as i64,
        ])?;
    }

    Ok(())
}

fn load_todos(conn: &Connection, checkpoint_id: i64) -> Result<Vec<Todo>> {
    let mut stmt = conn.prepare(
        "SELECT content, active_form, status, order_index FROM todos
         WHERE checkpoint_id = ?1 ORDER BY order_index, id",
    )?;
    let todos = stmt
        .query_map([checkpoint_id], |row| {
            let status: String = row.get(2)?;
            Ok(Todo {
                content: row.get(0)?,
                active_form: row.get(1)?,
                status: TodoStatus::from_str(&status).unwrap_or_default(),
                order_index: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(todos)
}

fn load_file_modifications(conn: &Connection, checkpoint_id: i64) -> Result<Vec<FileModification>> {
    let mut stmt = conn.prepare(
        "SELECT file_path, modification_type, description FROM file_modifications
         WHERE checkpoint_id = ?1 ORDER BY id",
    )?;
    let files = stmt
        .query_map([checkpoint_id], |row| {
            let modification_type: String = row.get(1)?;
            Ok(FileModification {
                file_path: row.get(0)?,
                modification_type: ModificationType::from_str(&modification_type).unwrap_or_default(),
                description: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(files)
}

fn load_key_decisions(conn: &Connection, checkpoint_id: i64) -> Result<Vec<KeyDecision>> {
    let mut stmt = conn.prepare(
        "SELECT decision_title, decision_content, order_index FROM key_decisions
         WHERE checkpoint_id = ?1 ORDER BY order_index, id",
    )?;
    let decisions = stmt
        .query_map([checkpoint_id], |row| {
            Ok(KeyDecision {
                decision_title: row.get(0)?,
                decision_content: row.get(1)?,
                order_index: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(decisions)
}

fn load_artifacts(conn: &Connection, checkpoint_id: i64) -> Result<Vec<Artifact>> {
    let mut stmt = conn.prepare(
        "SELECT artifact_title, artifact_content, artifact_type, order_index FROM artifacts
         WHERE checkpoint_id = ?1 ORDER BY order_index, id",
    )?;
    let artifacts = stmt
        .query_map([checkpoint_id], |row| {
            Ok(Artifact {
                artifact_title: row.get(0)?,
                artifact_content: row.get(1)?,
                artifact_type: row.get(2)?,
                order_index: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(artifacts)
}
