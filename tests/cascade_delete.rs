mod support;

use trek::model::{NewComment, NewEpic, NewTask};
use trek::store::{DependencyFilter, TaskFilter};
use trek::{EntityStore, Error};

use support::{add_subtask, add_task, memory_tracker};

fn comment(content: &str) -> NewComment {
    NewComment {
        author: "reviewer".to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn delete_task_removes_whole_subtree_and_its_edges() {
    let (store, tracker) = memory_tracker();
    let root = add_task(&tracker, "root").await;
    let outside_before = add_task(&tracker, "prerequisite").await;
    let outside_after = add_task(&tracker, "dependent").await;
    let child_a = add_subtask(&tracker, "child a", &root).await;
    let child_b = add_subtask(&tracker, "child b", &root).await;
    let grandchild = add_subtask(&tracker, "grandchild", &child_a).await;

    tracker.add_comment(&root, comment("first")).await.expect("c1");
    tracker.add_comment(&root, comment("second")).await.expect("c2");
    tracker.add_comment(&grandchild, comment("deep")).await.expect("c3");
    let survivor = tracker
        .add_comment(&outside_after, comment("keep me"))
        .await
        .expect("c4");

    tracker.add_dependency(&root, &outside_before).await.expect("out");
    tracker.add_dependency(&outside_after, &root).await.expect("in");
    tracker.add_dependency(&outside_after, &outside_before).await.expect("bystander");
    tracker.add_dependency(&child_b, &outside_before).await.expect("child edge");

    let report = tracker.delete_task(&root).await.expect("cascade");
    assert_eq!(
        report.deleted_tasks,
        vec![grandchild.clone(), child_a.clone(), child_b.clone(), root.clone()]
    );
    assert_eq!(report.deleted_comments, 3);
    assert_eq!(report.deleted_dependencies, 3);

    for id in [&root, &child_a, &child_b, &grandchild] {
        assert!(store.get_task(id).await.expect("get").is_none(), "{id} survived");
        assert!(store.list_comments(id).await.expect("comments").is_empty());
        assert!(store
            .list_dependencies(&DependencyFilter::from_task(id.as_str()))
            .await
            .expect("edges")
            .is_empty());
        assert!(store
            .list_dependencies(&DependencyFilter::onto_task(id.as_str()))
            .await
            .expect("edges")
            .is_empty());
    }

    let remaining = store
        .list_dependencies(&DependencyFilter::default())
        .await
        .expect("edges");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].task_id, outside_after);
    assert_eq!(remaining[0].depends_on_id, outside_before);
    assert_eq!(
        store.list_comments(&outside_after).await.expect("comments")[0].id,
        survivor.id
    );
    assert_eq!(
        store.list_tasks(&TaskFilter::default()).await.expect("tasks").len(),
        2
    );
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let (store, tracker) = memory_tracker();
    let root = add_task(&tracker, "root").await;
    let child = add_subtask(&tracker, "child", &root).await;
    let grandchild = add_subtask(&tracker, "grandchild", &child).await;
    let bystander = add_task(&tracker, "bystander").await;
    tracker.add_comment(&child, comment("note")).await.expect("comment");
    tracker.add_dependency(&bystander, &grandchild).await.expect("edge");

    tracker.delete_task(&root).await.expect("first delete");
    let before = serde_json::to_value(store.document().await).expect("document");

    for id in [&root, &child, &grandchild] {
        let err = tracker.delete_task(id).await.expect_err("already removed");
        assert!(matches!(err, Error::NotFound { entity: "Task", .. }));
        assert_eq!(err.status_code(), 404);
    }

    let after = serde_json::to_value(store.document().await).expect("document");
    assert_eq!(before, after);
    assert!(store.get_task(&bystander).await.expect("get").is_some());
}

#[tokio::test]
async fn deleting_a_subtask_leaves_parent_alone() {
    let (store, tracker) = memory_tracker();
    let parent = add_task(&tracker, "parent").await;
    let child = add_subtask(&tracker, "child", &parent).await;

    let report = tracker.delete_task(&child).await.expect("delete child");
    assert_eq!(report.deleted_tasks, vec![child]);
    assert!(store.get_task(&parent).await.expect("get").is_some());
    assert!(tracker.subtasks(&parent).await.expect("subtasks").is_empty());
}

#[tokio::test]
async fn delete_epic_orphans_its_tasks() {
    let (store, tracker) = memory_tracker();
    let epic = tracker
        .create_epic(NewEpic {
            title: "Launch".to_string(),
            ..NewEpic::default()
        })
        .await
        .expect("epic");
    let task = tracker
        .create_task(NewTask {
            epic_id: Some(epic.id.clone()),
            ..NewTask::titled("in epic")
        })
        .await
        .expect("task")
        .task;

    let orphaned = tracker.delete_epic(&epic.id).await.expect("delete epic");
    assert_eq!(orphaned, 1);

    assert!(store.get_epic(&epic.id).await.expect("get").is_none());
    let kept = store.get_task(&task.id).await.expect("get").expect("task kept");
    assert_eq!(kept.epic_id.as_deref(), Some(epic.id.as_str()));

    let err = tracker.delete_epic(&epic.id).await.expect_err("already gone");
    assert!(matches!(err, Error::NotFound { entity: "Epic", .. }));
}
