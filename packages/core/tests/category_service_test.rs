//! Integration tests for the category mutation protocol.
//!
//! Each test drives the service against a fresh file-backed database and
//! checks the resulting sibling order through the rebuilt tree view.

use inkspace_core::db::DatabaseService;
use inkspace_core::models::{CreateCategoryParams, MoveCategoryParams, UpdateCategoryParams};
use inkspace_core::services::{CategoryService, CategoryServiceError};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (Arc<CategoryService>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap(),
    );
    (Arc::new(CategoryService::new(db)), temp_dir)
}

fn params(pid: i64, next_id: i64, title: &str) -> CreateCategoryParams {
    CreateCategoryParams {
        pid: Some(pid),
        next_id: Some(next_id),
        title: title.to_string(),
        description: String::new(),
    }
}

async fn root_order(service: &CategoryService) -> Vec<i64> {
    service
        .tree()
        .await
        .unwrap()
        .iter()
        .map(|node| node.id())
        .collect()
}

#[tokio::test]
async fn test_create_appends_at_tail() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let c = service.create(params(0, 0, "c")).await.unwrap();

    assert_eq!(root_order(&service).await, vec![a, b, c]);

    // Appending repointed the old tail
    let view_b = service.retrieve(b).await.unwrap().unwrap();
    assert_eq!(view_b.next_id, c);
    let view_c = service.retrieve(c).await.unwrap().unwrap();
    assert_eq!(view_c.next_id, 0);
}

#[tokio::test]
async fn test_create_splices_before_sibling() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();

    // Splice between a and b
    let inserted = service.create(params(0, b, "between")).await.unwrap();

    assert_eq!(root_order(&service).await, vec![a, inserted, b]);

    let view_a = service.retrieve(a).await.unwrap().unwrap();
    assert_eq!(view_a.next_id, inserted);
    let view_inserted = service.retrieve(inserted).await.unwrap().unwrap();
    assert_eq!(view_inserted.next_id, b);
}

#[tokio::test]
async fn test_create_child_groups() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    let tree = service.tree().await.unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].id(), a);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].id(), child);
    assert_eq!(tree[1].id(), b);
    assert!(tree[1].children.is_empty());
}

#[tokio::test]
async fn test_create_rejects_unknown_references() {
    let (service, _temp_dir) = setup().await;
    let a = service.create(params(0, 0, "a")).await.unwrap();

    let err = service.create(params(99, 0, "x")).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    let err = service.create(params(0, 99, "x")).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    // No row was inserted by either failure
    assert_eq!(root_order(&service).await, vec![a]);
}

#[tokio::test]
async fn test_create_rejects_next_id_from_other_group() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    // child lives under a, so it cannot anchor a root-group splice
    let err = service.create(params(0, child, "x")).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));
}

#[tokio::test]
async fn test_remove_leaf_relinks_predecessor() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();

    service.remove(b).await.unwrap();

    assert_eq!(root_order(&service).await, vec![a]);
    let view_a = service.retrieve(a).await.unwrap().unwrap();
    assert_eq!(view_a.next_id, 0);
    assert!(service.retrieve(b).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_head_keeps_rest_of_chain() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let c = service.create(params(0, 0, "c")).await.unwrap();

    service.remove(a).await.unwrap();
    assert_eq!(root_order(&service).await, vec![b, c]);
}

#[tokio::test]
async fn test_remove_middle_closes_gap() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let c = service.create(params(0, 0, "c")).await.unwrap();

    service.remove(b).await.unwrap();
    assert_eq!(root_order(&service).await, vec![a, c]);

    let view_a = service.retrieve(a).await.unwrap().unwrap();
    assert_eq!(view_a.next_id, c);
}

#[tokio::test]
async fn test_remove_refuses_category_with_children() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    let err = service.remove(a).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::Integrity(_)));

    // Nothing was written
    assert_eq!(root_order(&service).await, vec![a]);
    assert!(service.retrieve(child).await.unwrap().is_some());

    // Removing the child first unblocks the parent
    service.remove(child).await.unwrap();
    service.remove(a).await.unwrap();
    assert!(root_order(&service).await.is_empty());
}

#[tokio::test]
async fn test_remove_unknown_id() {
    let (service, _temp_dir) = setup().await;
    let err = service.remove(42).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound { id: 42 }));
}

#[tokio::test]
async fn test_move_child_to_root_head() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    // Move the child to the root group, in front of a
    service
        .move_category(MoveCategoryParams {
            id: child,
            pid: Some(0),
            next_id: Some(a),
        })
        .await
        .unwrap();

    assert_eq!(root_order(&service).await, vec![child, a, b]);

    let tree = service.tree().await.unwrap();
    let a_node = tree.iter().find(|n| n.id() == a).unwrap();
    assert!(a_node.children.is_empty());

    let view = service.retrieve(child).await.unwrap().unwrap();
    assert_eq!(view.pid, 0);
    assert_eq!(view.next_id, a);
}

#[tokio::test]
async fn test_move_into_child_group() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    // b leaves the root group and becomes a's second child
    service
        .move_category(MoveCategoryParams {
            id: b,
            pid: Some(a),
            next_id: Some(0),
        })
        .await
        .unwrap();

    assert_eq!(root_order(&service).await, vec![a]);
    let tree = service.tree().await.unwrap();
    let children: Vec<i64> = tree[0].children.iter().map(|n| n.id()).collect();
    assert_eq!(children, vec![child, b]);
}

#[tokio::test]
async fn test_same_group_reorder() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();
    let c = service.create(params(0, 0, "c")).await.unwrap();

    // Tail to head
    service
        .move_category(MoveCategoryParams {
            id: c,
            pid: Some(0),
            next_id: Some(a),
        })
        .await
        .unwrap();
    assert_eq!(root_order(&service).await, vec![c, a, b]);

    // Head to tail
    service
        .move_category(MoveCategoryParams {
            id: c,
            pid: Some(0),
            next_id: Some(0),
        })
        .await
        .unwrap();
    assert_eq!(root_order(&service).await, vec![a, b, c]);

    // Middle hop forward
    service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(0),
            next_id: Some(c),
        })
        .await
        .unwrap();
    assert_eq!(root_order(&service).await, vec![b, a, c]);
}

#[tokio::test]
async fn test_move_to_current_position_is_a_no_op() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();

    service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(0),
            next_id: Some(b),
        })
        .await
        .unwrap();

    assert_eq!(root_order(&service).await, vec![a, b]);
    let view_a = service.retrieve(a).await.unwrap().unwrap();
    assert_eq!(view_a.next_id, b);
}

#[tokio::test]
async fn test_move_rejects_own_subtree() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();
    let grandchild = service.create(params(child, 0, "grandchild")).await.unwrap();

    // Directly under itself
    let err = service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(a),
            next_id: Some(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    // Under a descendant
    let err = service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(grandchild),
            next_id: Some(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));
}

#[tokio::test]
async fn test_move_rejects_bad_destination() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let child = service.create(params(a, 0, "child")).await.unwrap();

    let err = service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(99),
            next_id: Some(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    // next_id must be a sibling of the destination group
    let err = service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(0),
            next_id: Some(child),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    // A category cannot precede itself
    let err = service
        .move_category(MoveCategoryParams {
            id: a,
            pid: Some(0),
            next_id: Some(a),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));

    let err = service
        .move_category(MoveCategoryParams {
            id: 42,
            pid: Some(0),
            next_id: Some(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound { id: 42 }));
}

#[tokio::test]
async fn test_update_changes_content_only() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let b = service.create(params(0, 0, "b")).await.unwrap();

    service
        .update(UpdateCategoryParams {
            id: a,
            title: "renamed".to_string(),
            description: "now with a description".to_string(),
        })
        .await
        .unwrap();

    let view = service.retrieve(a).await.unwrap().unwrap();
    assert_eq!(view.title, "renamed");
    assert_eq!(view.description, "now with a description");
    // Structure untouched
    assert_eq!(view.pid, 0);
    assert_eq!(view.next_id, b);
    assert_eq!(root_order(&service).await, vec![a, b]);

    let err = service
        .update(UpdateCategoryParams {
            id: 42,
            title: "x".to_string(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound { id: 42 }));
}

#[tokio::test]
async fn test_retrieve_unknown_returns_none() {
    let (service, _temp_dir) = setup().await;
    assert!(service.retrieve(7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reload_reproduces_identical_tree() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();
    let _b = service.create(params(0, 0, "b")).await.unwrap();
    let _child = service.create(params(a, 0, "child")).await.unwrap();

    let first = service.tree().await.unwrap();

    // Invalidate without mutating; the rebuild must be identical
    let cache = service.tree_cache();
    cache.mark_stale();
    assert!(cache.is_stale());
    let second = service.tree().await.unwrap();

    assert_eq!(first, second);
    assert!(!cache.is_stale());
}

#[tokio::test]
async fn test_remove_hook_vetoes_removal() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();

    let hook_id = service.register_remove_hook(|id| {
        Box::pin(async move {
            Err(CategoryServiceError::integrity(format!(
                "category {} is pinned",
                id
            )))
        })
    });

    let err = service.remove(a).await.unwrap_err();
    assert!(matches!(err, CategoryServiceError::Integrity(_)));
    assert!(service.retrieve(a).await.unwrap().is_some());

    assert!(service.unregister_remove_hook(hook_id));
    service.remove(a).await.unwrap();
    assert!(service.retrieve(a).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_hooks_receive_the_target_id() {
    let (service, _temp_dir) = setup().await;

    let a = service.create(params(0, 0, "a")).await.unwrap();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    service.register_remove_hook(move |id| {
        let seen = seen_clone.clone();
        Box::pin(async move {
            seen.lock().unwrap().push(id);
            Ok(())
        })
    });

    service.remove(a).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![a]);
}
