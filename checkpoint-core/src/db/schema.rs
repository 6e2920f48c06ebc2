pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    summary TEXT,
    current_goal TEXT,
    working_directory TEXT,
    git_branch TEXT,
    git_status TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checkpoint_id INTEGER NOT NULL REFERENCES checkpoints(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    active_form TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'in_progress', 'completed')),
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS file_modifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checkpoint_id INTEGER NOT NULL REFERENCES checkpoints(id) ON DELETE CASCADE,
    file_path TEXT NOT NULL,
    modification_type TEXT NOT NULL DEFAULT 'modified' CHECK (modification_type IN ('created', 'modified', 'deleted')),
    description TEXT
);

CREATE TABLE IF NOT EXISTS key_decisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checkpoint_id INTEGER NOT NULL REFERENCES checkpoints(id) ON DELETE CASCADE,
    decision_title TEXT NOT NULL,
    decision_content TEXT,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS artifacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checkpoint_id INTEGER NOT NULL REFERENCES checkpoints(id) ON DELETE CASCADE,
    artifact_title TEXT NOT NULL,
    artifact_content TEXT,
    artifact_type TEXT,
    order_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_checkpoints_updated ON checkpoints(updated_at);
CREATE INDEX IF NOT EXISTS idx_todos_checkpoint ON todos(checkpoint_id);
CREATE INDEX IF NOT EXISTS idx_file_modifications_checkpoint ON file_modifications(checkpoint_id);
CREATE INDEX IF NOT EXISTS idx_key_decisions_checkpoint ON key_decisions(checkpoint_id);
CREATE INDEX IF NOT EXISTS idx_artifacts_checkpoint ON artifacts(checkpoint_id);
"#;
