mod support;

use std::sync::Arc;

use trek::model::{EpicStatus, EpicUpdate, NewComment, NewEpic, NewTask, TaskStatus, TaskUpdate};
use trek::{Config, Error, MemoryStore, Tracker};

use support::{add_subtask, add_task, memory_tracker};

#[tokio::test]
async fn create_task_applies_defaults() {
    let (store, tracker) = memory_tracker();
    let view = tracker
        .create_task(NewTask::titled("  Trim me  "))
        .await
        .expect("create");

    let task = view.task;
    assert!(task.id.starts_with("TREK-"));
    assert_eq!(task.title, "Trim me");
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.priority, 2);
    assert_eq!(task.created_at, task.updated_at);
    assert_eq!(task.project_id, store.document().await.project.id);
    assert!(view.depends_on.is_empty() && view.blocks.is_empty());
}

#[tokio::test]
async fn create_task_validates_input() {
    let (_store, tracker) = memory_tracker();

    let err = tracker
        .create_task(NewTask::titled("   "))
        .await
        .expect_err("blank title");
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let err = tracker
        .create_task(NewTask {
            priority: Some(9),
            ..NewTask::titled("too urgent")
        })
        .await
        .expect_err("priority");
    assert!(matches!(err, Error::Validation(_)));

    let err = tracker
        .create_task(NewTask {
            epic_id: Some("EPIC-nope".to_string()),
            ..NewTask::titled("lost")
        })
        .await
        .expect_err("epic");
    assert!(matches!(err, Error::NotFound { entity: "Epic", .. }));

    let err = tracker
        .create_task(NewTask {
            parent_task_id: Some("TREK-nope".to_string()),
            ..NewTask::titled("orphan")
        })
        .await
        .expect_err("parent");
    assert!(matches!(err, Error::NotFound { entity: "Task", .. }));
}

#[tokio::test]
async fn configured_prefix_and_priority_are_used() {
    let mut config = Config::default();
    config.ids.task_prefix = "JOB".to_string();
    config.ids.suffix_len = 5;
    config.tasks.default_priority = 0;
    let tracker = Tracker::new(Arc::new(MemoryStore::new("cfg")), config);

    let task = tracker
        .create_task(NewTask::titled("configured"))
        .await
        .expect("create")
        .task;
    assert!(task.id.starts_with("JOB-"));
    assert_eq!(task.id.len(), "JOB-".len() + 5);
    assert_eq!(task.priority, 0);
}

#[tokio::test]
async fn update_task_changes_fields_and_bumps_timestamp() {
    let (_store, tracker) = memory_tracker();
    let epic = tracker
        .create_epic(NewEpic {
            title: "Epic".to_string(),
            ..NewEpic::default()
        })
        .await
        .expect("epic");
    let id = add_task(&tracker, "before").await;
    let before = tracker.get_task(&id).await.expect("get").task;

    let after = tracker
        .update_task(
            &id,
            TaskUpdate {
                title: Some("after".to_string()),
                description: Some(Some("details".to_string())),
                priority: Some(4),
                epic_id: Some(Some(epic.id.clone())),
                tags: Some(vec!["docs".to_string()]),
                ..TaskUpdate::default()
            },
        )
        .await
        .expect("update")
        .task;
    assert_eq!(after.title, "after");
    assert_eq!(after.description.as_deref(), Some("details"));
    assert_eq!(after.priority, 4);
    assert_eq!(after.epic_id.as_deref(), Some(epic.id.as_str()));
    assert_eq!(after.tags, vec!["docs"]);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);

    let cleared = tracker
        .update_task(
            &id,
            TaskUpdate {
                description: Some(None),
                epic_id: Some(None),
                ..TaskUpdate::default()
            },
        )
        .await
        .expect("clear")
        .task;
    assert!(cleared.description.is_none());
    assert!(cleared.epic_id.is_none());

    let err = tracker
        .update_task(
            &id,
            TaskUpdate {
                epic_id: Some(Some("EPIC-missing".to_string())),
                ..TaskUpdate::default()
            },
        )
        .await
        .expect_err("missing epic");
    assert!(matches!(err, Error::NotFound { entity: "Epic", .. }));

    let err = tracker
        .update_task("TREK-missing", TaskUpdate::default())
        .await
        .expect_err("missing task");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let (_store, tracker) = memory_tracker();
    let id = add_task(&tracker, "discussed").await;

    for content in ["first", "second", "third"] {
        tracker
            .add_comment(
                &id,
                NewComment {
                    author: "ana".to_string(),
                    content: content.to_string(),
                },
            )
            .await
            .expect("comment");
    }

    let comments = tracker.list_comments(&id).await.expect("list");
    let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert!(comments.iter().all(|c| c.id.starts_with("CMT-")));

    tracker.delete_comment(&comments[1].id).await.expect("delete");
    assert_eq!(tracker.list_comments(&id).await.expect("list").len(), 2);
    let err = tracker
        .delete_comment(&comments[1].id)
        .await
        .expect_err("already deleted");
    assert!(matches!(err, Error::NotFound { entity: "Comment", .. }));

    let err = tracker
        .add_comment(
            "TREK-missing",
            NewComment {
                author: "ana".to_string(),
                content: "hello".to_string(),
            },
        )
        .await
        .expect_err("missing task");
    assert!(matches!(err, Error::NotFound { entity: "Task", .. }));

    let err = tracker
        .add_comment(
            &id,
            NewComment {
                author: "ana".to_string(),
                content: "  ".to_string(),
            },
        )
        .await
        .expect_err("blank");
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn archive_moves_only_completed_items() {
    let (_store, tracker) = memory_tracker();
    let done = add_task(&tracker, "done").await;
    let open = add_task(&tracker, "open").await;
    let child = add_subtask(&tracker, "done child", &open).await;
    for id in [&done, &child] {
        tracker
            .update_task(
                id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..TaskUpdate::default()
                },
            )
            .await
            .expect("complete");
    }
    let epic = tracker
        .create_epic(NewEpic {
            title: "finished".to_string(),
            ..NewEpic::default()
        })
        .await
        .expect("epic");
    tracker
        .update_epic(
            &epic.id,
            EpicUpdate {
                status: Some(EpicStatus::Completed),
                ..EpicUpdate::default()
            },
        )
        .await
        .expect("complete epic");

    let report = tracker.archive_completed().await.expect("archive");
    assert_eq!(report.tasks_archived, 2);
    assert_eq!(report.epics_archived, 1);

    assert_eq!(
        tracker.get_task(&done).await.expect("done").task.status,
        TaskStatus::Archived
    );
    assert_eq!(
        tracker.get_task(&open).await.expect("open").task.status,
        TaskStatus::Todo
    );
    assert_eq!(
        tracker.get_epic(&epic.id).await.expect("epic").status,
        EpicStatus::Archived
    );

    let again = tracker.archive_completed().await.expect("archive again");
    assert_eq!((again.tasks_archived, again.epics_archived), (0, 0));
}

#[tokio::test]
async fn task_view_serializes_camel_case() {
    let (_store, tracker) = memory_tracker();
    let parent = add_task(&tracker, "parent").await;
    let child = add_subtask(&tracker, "child", &parent).await;

    let view = tracker.get_task(&child).await.expect("view");
    let value = serde_json::to_value(&view).expect("json");
    assert_eq!(value["parentTaskId"], parent.as_str());
    assert_eq!(value["status"], "todo");
    assert!(value["dependsOn"].as_array().expect("array").is_empty());
    assert!(value["updatedAt"].is_string());
}
