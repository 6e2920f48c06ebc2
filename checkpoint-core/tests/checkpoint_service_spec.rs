use speculate2::speculate;

speculate! {
    use checkpoint_core::models::*;
    use checkpoint_core::{CheckpointError, CheckpointService, Database};
    use serde_json::json;
    use std::thread;
    use std::time::Duration;

    fn setup_service() -> CheckpointService {
        let db = Database::open_memory().expect("Failed to create test database");
        db.migrate().expect("Failed to migrate test database");
        CheckpointService::new(db)
    }

    // Keeps updated_at strictly increasing between consecutive writes.
    fn tick() {
        thread::sleep(Duration::from_millis(5));
    }

    fn todo_contents(checkpoint: &Checkpoint) -> Vec<&str> {
        checkpoint.todos.iter().map(|t| t.content.as_str()).collect()
    }

    describe "save" {
        it "creates a checkpoint with exactly the normalized children" {
            let service = setup_service();
            let outcome = service.save("auth-refactor", &json!({
                "summary": "Halfway through the auth refactor",
                "current_goal": "Replace session cookies",
                "todos": [
                    { "content": "Write migration", "status": "completed" },
                    { "title": "Update handlers", "activeForm": "Updating handlers", "status": "in_progress" },
                ],
                "file_modifications": [{ "file_path": "src/auth.rs", "modification_type": "created" }],
                "key_decisions": [{ "title": "Use JWT", "rationale": "Stateless" }],
                "artifacts": [{ "name": "plan.md", "content": "1. migrate" }],
            })).unwrap();

            assert_eq!(outcome.status, "success");
            assert_eq!(outcome.action, SaveAction::Created);
            assert_eq!(outcome.counts, ChildCounts {
                todos: 2,
                file_modifications: 1,
                key_decisions: 1,
                artifacts: 1,
            });

            let checkpoint = service.resume("auth-refactor").unwrap();
            assert_eq!(checkpoint.id, outcome.checkpoint_id);
            assert_eq!(checkpoint.counts(), outcome.counts);
            assert_eq!(checkpoint.todos[1].active_form, "Updating handlers");
            assert_eq!(checkpoint.todos[1].status, TodoStatus::InProgress);
            assert_eq!(checkpoint.file_modifications[0].modification_type, ModificationType::Created);
            assert_eq!(checkpoint.key_decisions[0].decision_content.as_deref(), Some("Stateless"));
        }

        it "trims the name and rejects blank names" {
            let service = setup_service();
            service.save("  spaced  ", &json!({})).unwrap();
            assert!(service.resume("spaced").is_ok());
            assert_eq!(service.list().unwrap().count, 1);

            let err = service.save("   ", &json!({})).unwrap_err();
            assert!(matches!(err, CheckpointError::Validation(_)));
            assert_eq!(service.list().unwrap().count, 1);
        }

        it "replaces all children on a second save" {
            let service = setup_service();
            service.save("cp", &json!({ "todos": [{ "content": "A" }, { "content": "B" }] })).unwrap();
            let outcome = service.save("cp", &json!({ "todos": [{ "content": "C" }] })).unwrap();

            assert_eq!(outcome.action, SaveAction::Updated);
            let checkpoint = service.resume("cp").unwrap();
            assert_eq!(todo_contents(&checkpoint), ["C"]);
        }

        it "keeps created_at and advances updated_at" {
            let service = setup_service();
            service.save("cp", &json!({ "summary": "one" })).unwrap();
            let first = service.resume("cp").unwrap();
            tick();
            service.save("cp", &json!({ "summary": "two" })).unwrap();
            let second = service.resume("cp").unwrap();

            assert_eq!(first.created_at, second.created_at);
            assert!(second.updated_at > first.updated_at);
            assert_eq!(second.summary.as_deref(), Some("two"));
        }

        it "aborts entirely when a file modification lacks file_path" {
            let service = setup_service();
            service.save("cp", &json!({
                "summary": "original",
                "todos": [{ "content": "keep" }],
                "file_modifications": [{ "file_path": "a.rs" }],
            })).unwrap();

            let err = service.save("cp", &json!({
                "summary": "changed",
                "todos": [{ "content": "replace" }],
                "file_modifications": [{ "file_path": "b.rs" }, { "description": "missing path" }],
            })).unwrap_err();
            assert!(matches!(err, CheckpointError::Validation(_)));

            let checkpoint = service.resume("cp").unwrap();
            assert_eq!(checkpoint.summary.as_deref(), Some("original"));
            assert_eq!(todo_contents(&checkpoint), ["keep"]);
            assert_eq!(checkpoint.file_modifications[0].file_path, "a.rs");
        }

        it "creates nothing when the first save fails validation" {
            let service = setup_service();
            let err = service.save("fresh", &json!({ "file_modifications": [42] })).unwrap_err();
            assert!(matches!(err, CheckpointError::Validation(_)));
            assert!(matches!(service.resume("fresh"), Err(CheckpointError::NotFound(_))));
        }

        it "drops a todo without content and counts only the survivor" {
            let service = setup_service();
            let outcome = service.save("cp", &json!({
                "todos": [{ "content": "valid" }, { "status": "pending" }],
            })).unwrap();

            assert_eq!(outcome.counts.todos, 1);
            assert_eq!(todo_contents(&service.resume("cp").unwrap()), ["valid"]);
        }

        it "accepts a document carrying its own name" {
            let service = setup_service();
            let outcome = service.save_document(&json!({
                "name": "from-stdin",
                "files_modified": [{ "file_path": "README.md", "status": "deleted" }],
            })).unwrap();
            assert_eq!(outcome.counts.file_modifications, 1);

            let missing = service.save_document(&json!({ "summary": "no name" })).unwrap_err();
            assert!(missing.to_string().contains("name"));
        }
    }

    describe "resume" {
        it "returns children in submission order with exact scalar fields" {
            let service = setup_service();
            service.save("cp", &json!({
                "summary": "s",
                "current_goal": "g",
                "context": { "working_directory": "/work", "git_branch": "main", "git_status": "dirty" },
                "todos": [{ "content": "3" }, { "content": "1" }, { "content": "2" }],
                "key_decisions": [{ "decision_title": "z" }, { "decision_title": "a" }],
                "artifacts": [{ "artifact_title": "second" }, { "artifact_title": "first" }],
                "file_modifications": [{ "file_path": "z.rs" }, { "file_path": "a.rs" }],
            })).unwrap();

            let checkpoint = service.resume("cp").unwrap();
            assert_eq!(checkpoint.summary.as_deref(), Some("s"));
            assert_eq!(checkpoint.current_goal.as_deref(), Some("g"));
            assert_eq!(checkpoint.working_directory.as_deref(), Some("/work"));
            assert_eq!(checkpoint.git_branch.as_deref(), Some("main"));
            assert_eq!(checkpoint.git_status.as_deref(), Some("dirty"));
            assert_eq!(todo_contents(&checkpoint), ["3", "1", "2"]);
            assert_eq!(
                checkpoint.todos.iter().map(|t| t.order_index).collect::<Vec<_>>(),
                [0, 1, 2]
            );
            assert_eq!(checkpoint.key_decisions[0].decision_title, "z");
            assert_eq!(checkpoint.artifacts[0].artifact_title, "second");
            assert_eq!(checkpoint.file_modifications[0].file_path, "z.rs");
        }

        it "keeps empty summary and goal strings" {
            let service = setup_service();
            service.save("cp", &json!({ "summary": "", "current_goal": "" })).unwrap();

            let checkpoint = service.resume("cp").unwrap();
            assert_eq!(checkpoint.summary.as_deref(), Some(""));
            assert_eq!(checkpoint.current_goal.as_deref(), Some(""));

            service.update("cp", &json!({ "summary": "filled" })).unwrap();
            service.save("cp", &json!({ "summary": "" })).unwrap();
            assert_eq!(service.resume("cp").unwrap().summary.as_deref(), Some(""));
        }

        it "reports unknown names as not found" {
            let service = setup_service();
            let err = service.resume("nope").unwrap_err();
            assert!(matches!(err, CheckpointError::NotFound(ref name) if name == "nope"));
        }

        it "renders YAML without internal ids" {
            let service = setup_service();
            service.save("cp", &json!({ "summary": "yaml me", "todos": [{ "content": "t" }] })).unwrap();

            let yaml = service.resume_yaml("cp").unwrap();
            assert!(yaml.contains("name: cp"));
            assert!(yaml.contains("summary: yaml me"));
            assert!(yaml.contains("status: pending"));
            assert!(!yaml.contains("id:"));
        }
    }

    describe "list" {
        it "returns an empty list for an empty store" {
            let service = setup_service();
            let list = service.list().unwrap();
            assert_eq!(list.count, 0);
            assert!(list.checkpoints.is_empty());
        }

        it "orders by most recent update" {
            let service = setup_service();
            service.save("A", &json!({})).unwrap();
            tick();
            service.save("B", &json!({})).unwrap();
            tick();
            service.update("A", &json!({ "summary": "touched" })).unwrap();

            let names: Vec<_> = service.list().unwrap().checkpoints.into_iter().map(|c| c.name).collect();
            assert_eq!(names, ["A", "B"]);
        }

        it "includes child counts" {
            let service = setup_service();
            service.save("cp", &json!({
                "todos": [{ "content": "a" }],
                "key_decisions": [{ "title": "d1" }, { "title": "d2" }],
            })).unwrap();

            let list = service.list().unwrap();
            assert_eq!(list.checkpoints[0].counts.todos, 1);
            assert_eq!(list.checkpoints[0].counts.key_decisions, 2);
        }
    }

    describe "delete" {
        it "removes the checkpoint and its children" {
            let service = setup_service();
            service.save("cp", &json!({ "todos": [{ "content": "a" }] })).unwrap();
            service.save("other", &json!({})).unwrap();

            let outcome = service.delete("cp").unwrap();
            assert_eq!(outcome.status, "success");

            assert!(matches!(service.resume("cp"), Err(CheckpointError::NotFound(_))));
            let names: Vec<_> = service.list().unwrap().checkpoints.into_iter().map(|c| c.name).collect();
            assert_eq!(names, ["other"]);

            let orphans: i64 = service.database().with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?)
            }).unwrap();
            assert_eq!(orphans, 0);
        }

        it "reports unknown names as not found" {
            let service = setup_service();
            assert!(matches!(service.delete("nope"), Err(CheckpointError::NotFound(_))));
        }
    }

    describe "update" {
        it "changes only the given fields and keeps children" {
            let service = setup_service();
            service.save("cp", &json!({
                "summary": "old",
                "git_branch": "main",
                "todos": [{ "content": "stay" }],
            })).unwrap();

            let outcome = service.update("cp", &json!({ "summary": "new", "bogus": 1 })).unwrap();
            assert_eq!(outcome.updated_fields, ["summary"]);

            let checkpoint = service.resume("cp").unwrap();
            assert_eq!(checkpoint.summary.as_deref(), Some("new"));
            assert_eq!(checkpoint.git_branch.as_deref(), Some("main"));
            assert_eq!(todo_contents(&checkpoint), ["stay"]);
        }

        it "fails without writing when no field is recognized" {
            let service = setup_service();
            service.save("cp", &json!({ "summary": "same" })).unwrap();
            let before = service.resume("cp").unwrap();
            tick();

            for updates in [json!({}), json!({ "priority": "high" })] {
                let err = service.update("cp", &updates).unwrap_err();
                assert!(matches!(err, CheckpointError::Validation(_)));
            }

            let after = service.resume("cp").unwrap();
            assert_eq!(before.updated_at, after.updated_at);
        }

        it "reports unknown names as not found" {
            let service = setup_service();
            let err = service.update("nope", &json!({ "summary": "x" })).unwrap_err();
            assert!(matches!(err, CheckpointError::NotFound(_)));
        }
    }

    describe "concurrency" {
        it "serializes same-name saves from separate connections" {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("checkpoints.db");
            Database::open(&path).unwrap().migrate().unwrap();

            let workers: Vec<_> = (0..8)
                .map(|worker| {
                    let path = path.clone();
                    thread::spawn(move || {
                        let service = CheckpointService::new(Database::open(&path).unwrap());
                        let mut errors = 0;
                        for round in 0..25 {
                            let data = json!({
                                "summary": format!("worker {worker} round {round}"),
                                "todos": [{ "content": "first" }, { "content": "second" }],
                            });
                            if service.save("shared", &data).is_err() {
                                errors += 1;
                            }
                        }
                        errors
                    })
                })
                .collect();

            let errors: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
            assert_eq!(errors, 0);

            let db = Database::open(&path).unwrap();
            let service = CheckpointService::new(db);
            let list = service.list().unwrap();
            assert_eq!(list.count, 1);
            assert_eq!(list.checkpoints[0].counts.todos, 2);
            assert_eq!(todo_contents(&service.resume("shared").unwrap()), ["first", "second"]);
        }
    }

    describe "persistence" {
        it "survives reopening a file-backed database" {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("checkpoints.db");

            {
                let db = Database::open(&path).unwrap();
                db.migrate().unwrap();
                CheckpointService::new(db).save("durable", &json!({ "summary": "on disk" })).unwrap();
            }

            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();
            let checkpoint = CheckpointService::new(db).resume("durable").unwrap();
            assert_eq!(checkpoint.summary.as_deref(), Some("on disk"));
        }
    }
}
