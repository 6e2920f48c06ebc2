//! Plain-text reports printed by the `ckpt` command line.

use chrono::{DateTime, Utc};

use checkpoint_core::models::*;

const SEPARATOR_WIDTH: usize = 80;
const WRAP_WIDTH: usize = 76;
const LIST_SUMMARY_CHARS: usize = 150;
const HINT_SUMMARY_CHARS: usize = 100;
const ARTIFACT_PREVIEW_CHARS: usize = 200;
const DECISION_INDENT: &str = "     ";

fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Cut `text` to at most `max_chars` characters, appending `...` when
/// anything was removed.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Like [`truncate`], but trailing whitespace of the kept part is dropped
/// before the ellipsis. Used for listing summaries.
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    let summary = summary.trim();
    match summary.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", summary[..cut].trim_end()),
        None => summary.to_string(),
    }
}


/// Greedy word wrap. Words longer than the line are kept whole.
pub fn wrap(text: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::from(initial_indent);
    let mut line_has_word = false;

    for word in text.split_whitespace() {
        let line_len = line.chars().count();
        if line_has_word && line_len + 1 + word.chars().count() > width {
            lines.push(std::mem::replace(&mut line, String::from(subsequent_indent)));
            line_has_word = false;
        }
        if line_has_word {
            line.push(' ');
        }
        line.push_str(word);
        line_has_word = true;
    }
    if line_has_word {
        lines.push(line);
    }
    lines.join("\n")
}

pub fn status_glyph(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Completed => "[✓]",
        TodoStatus::InProgress => "[→]",
        TodoStatus::Pending => "[ ]",
    }
}

/// Full report for one checkpoint, as printed by `ckpt resume`.
pub fn render_checkpoint(checkpoint: &Checkpoint) -> String {
    let rule = separator();
    let mut lines = vec![
        String::new(),
        rule.clone(),
        format!("CHECKPOINT: {}", checkpoint.name),
        rule.clone(),
        String::new(),
        format!("CREATED: {}", format_timestamp(&checkpoint.created_at)),
        format!("UPDATED: {}", format_timestamp(&checkpoint.updated_at)),
        String::new(),
    ];

    for (heading, body) in [
        ("SUMMARY", &checkpoint.summary),
        ("CURRENT GOAL", &checkpoint.current_goal),
    ] {
        if let Some(body) = body {
            lines.push(format!("{heading}:"));
            lines.push(wrap(body, WRAP_WIDTH, "  ", "  "));
            lines.push(String::new());
        }
    }

    let environment = [
        ("Working Directory", &checkpoint.working_directory),
        ("Git Branch", &checkpoint.git_branch),
        ("Git Status", &checkpoint.git_status),
    ];
    if environment.iter().any(|(_, value)| value.is_some()) {
        lines.push("ENVIRONMENT:".to_string());
        for (label, value) in environment {
            if let Some(value) = value {
                lines.push(format!("  {label}: {value}"));
            }
        }
        lines.push(String::new());
    }

    if !checkpoint.todos.is_empty() {
        lines.push(format!("TODOS ({} total):", checkpoint.todos.len()));
        lines.extend(
            checkpoint
                .todos
                .iter()
                .map(|todo| format!("  {} {}", status_glyph(todo.status), todo.content)),
        );
        lines.push(String::new());
    }

    if !checkpoint.file_modifications.is_empty() {
        lines.push(format!(
            "FILES MODIFIED ({} total):",
            checkpoint.file_modifications.len()
        ));
        lines.extend(checkpoint.file_modifications.iter().map(|file| {
            format!("  - {} ({})", file.file_path, file.modification_type.as_str())
        }));
        lines.push(String::new());
    }

    if !checkpoint.key_decisions.is_empty() {
        lines.push(format!("KEY DECISIONS ({} total):", checkpoint.key_decisions.len()));
        for (idx, decision) in checkpoint.key_decisions.iter().enumerate() {
            lines.push(format!("  {}. {}", idx + 1, decision.decision_title));
            if let Some(content) = decision.decision_content.as_deref().filter(|c| !c.is_empty()) {
                let wrapped = wrap(content, WRAP_WIDTH, "", DECISION_INDENT);
                lines.push(format!("{DECISION_INDENT}{wrapped}"));
            }
        }
        lines.push(String::new());
    }

    if !checkpoint.artifacts.is_empty() {
        lines.push(format!("ARTIFACTS ({} total):", checkpoint.artifacts.len()));
        for (idx, artifact) in checkpoint.artifacts.iter().enumerate() {
            let kind = artifact.artifact_type.as_deref().unwrap_or("unknown");
            let preview = match artifact.artifact_content.as_deref() {
                Some(content) if !content.is_empty() => truncate(content, ARTIFACT_PREVIEW_CHARS),
                _ => "[No content]".to_string(),
            };
            lines.push(format!("  {}. {} (type: {})", idx + 1, artifact.artifact_title, kind));
            lines.push(format!("     {preview}"));
        }
        lines.push(String::new());
    }

    lines.push(rule);
    lines.join("\n")
}

/// Listing of every checkpoint, as printed by `ckpt list`.
pub fn render_list(checkpoints: &[CheckpointSummary]) -> String {
    let rule = separator();

    if checkpoints.is_empty() {
        return [
            rule.as_str(),
            "NO CHECKPOINTS FOUND",
            rule.as_str(),
            "",
            "The checkpoint database is empty.",
            "Use `ckpt save` to create your first checkpoint.",
        ]
        .join("\n");
    }

    let mut lines = vec![
        rule.clone(),
        format!("AVAILABLE CHECKPOINTS ({} total)", checkpoints.len()),
        rule.clone(),
        String::new(),
    ];

    for (idx, checkpoint) in checkpoints.iter().enumerate() {
        let summary = match checkpoint.summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => truncate_summary(summary, LIST_SUMMARY_CHARS),
            _ => "[No summary provided]".to_string(),
        };
        let counts = checkpoint.counts;

        lines.push(format!("{}. {}", idx + 1, checkpoint.name));
        lines.push(format!(
            "   Updated: {} | Created: {}",
            format_timestamp(&checkpoint.updated_at),
            format_timestamp(&checkpoint.created_at)
        ));
        lines.push(format!("   Summary: {summary}"));
        lines.push(format!(
            "   Stats: {} todos, {} files, {} decisions, {} artifacts",
            counts.todos, counts.file_modifications, counts.key_decisions, counts.artifacts
        ));
        lines.push(String::new());
    }

    lines.push(rule);
    lines.push(String::new());
    lines.push("Use `ckpt resume <checkpoint-name>` to restore a checkpoint".to_string());
    lines.join("\n")
}

/// Short list shown when `ckpt resume` is given an unknown name.
pub fn render_available(checkpoints: &[CheckpointSummary]) -> String {
    if checkpoints.is_empty() {
        return "No checkpoints found in database".to_string();
    }

    let mut lines = vec!["Available checkpoints:".to_string()];
    for (idx, checkpoint) in checkpoints.iter().enumerate() {
        let summary = checkpoint.summary.as_deref().unwrap_or("[No summary]");
        lines.push(format!(
            "  {}. {} (updated: {})",
            idx + 1,
            checkpoint.name,
            format_timestamp(&checkpoint.updated_at)
        ));
        lines.push(format!("     Summary: {}", truncate(summary, HINT_SUMMARY_CHARS)));
    }
    lines.join("\n")
}
