/// Image attach/detach tests
///
/// These tests verify the only optimistic path of the sync core:
/// - Attach uploads, stores the URL and merges it before any push
/// - Detach deletes the blob, clears the URL and merges null
/// - Failures leave the displayed task untouched

mod common;

use common::{wait_for, TestContext, IMAGE_URI};
use tasknest_shared::backend::memory::FaultPoint;
use tasknest_shared::models::TaskScope;
use tasknest_shared::paths::CollectionPath;
use tasknest_shared::{SyncError, UploadError};
use tasknest_sync::notice::Action;
use tasknest_sync::{NoticeLevel, NoticeSink, TaskScreen};

fn scope() -> TaskScope {
    TaskScope::new("p1", "c1")
}

fn tasks_path() -> CollectionPath {
    CollectionPath::tasks("p1", "c1")
}

/// Opens a task screen with one displayed task
async fn screen_with_task(t: &TestContext) -> (TaskScreen, String) {
    let owner = t.ctx.identity().current_principal().unwrap();
    let task_id = t.insert(&tasks_path(), "Write", &owner.id).await.unwrap();

    let screen = TaskScreen::open(&t.ctx, scope(), t.notices.clone()).unwrap();
    wait_for(|| screen.records().len() == 1, 2).await.unwrap();
    (screen, task_id)
}

/// The new URL is visible before any push, and the push changes nothing
#[tokio::test]
async fn test_attach_merges_before_push() {
    let mut t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;
    let pushes_before = screen.pushes();

    t.backend.documents.pause_pushes();
    let url = screen.attach_image(&task_id, IMAGE_URI).await.unwrap();

    assert!(url.starts_with("memory://tasknest-test.appspot.com/tasks/"));
    assert!(url.ends_with(".jpg"));
    assert_eq!(screen.pushes(), pushes_before);
    assert_eq!(screen.record(&task_id).unwrap().image_url, Some(url.clone()));
    assert!(screen.has_pending_override(&task_id));

    let stored = t.backend.documents.document(&tasks_path(), &task_id).unwrap();
    assert_eq!(stored.get_str("imageUrl"), Some(url.as_str()));

    t.backend.documents.resume_pushes();
    wait_for(|| screen.pushes() > pushes_before, 2).await.unwrap();

    assert!(!screen.has_pending_override(&task_id));
    assert_eq!(screen.record(&task_id).unwrap().image_url, Some(url));

    let notices = t.drain_notices();
    assert_eq!(notices.last().unwrap().action, Action::AttachImage);
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Success);

    screen.close().await;
}

/// Blob paths follow tasks/{taskId}/{millis}.jpg
#[tokio::test]
async fn test_attach_blob_path_layout() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;

    screen.attach_image(&task_id, IMAGE_URI).await.unwrap();

    let paths = t.backend.blobs.paths();
    assert_eq!(paths.len(), 1);
    let parts: Vec<&str> = paths[0].split('/').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "tasks");
    assert_eq!(parts[1], task_id);
    let millis = parts[2].strip_suffix(".jpg").unwrap();
    assert!(millis.parse::<i64>().unwrap() > 0);

    screen.close().await;
}

/// An upload failure merges nothing and writes nothing
#[tokio::test]
async fn test_upload_failure() {
    let mut t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;
    t.backend.faults.fail_next(FaultPoint::Upload);

    let err = screen.attach_image(&task_id, IMAGE_URI).await.unwrap_err();
    assert!(matches!(err, SyncError::Upload(UploadError::Transfer { .. })));
    assert_eq!(screen.record(&task_id).unwrap().image_url, None);
    assert!(!screen.has_pending_override(&task_id));
    assert!(t.backend.blobs.is_empty());

    let stored = t.backend.documents.document(&tasks_path(), &task_id).unwrap();
    assert_eq!(stored.get_str("imageUrl"), None);

    let notices = t.drain_notices();
    assert_eq!(notices.last().unwrap().message, "Could not upload the image.");

    screen.close().await;
}

/// An unreadable local image is an upload failure
#[tokio::test]
async fn test_unreadable_image() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;

    let err = screen
        .attach_image(&task_id, "file:///photos/missing.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Upload(UploadError::Read { .. })));
    assert!(t.backend.blobs.is_empty());

    screen.close().await;
}

/// Update failure after upload leaves an orphaned blob and a backend error
#[tokio::test]
async fn test_update_failure_after_upload() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;
    t.backend.faults.fail_next(FaultPoint::Update);

    let err = screen.attach_image(&task_id, IMAGE_URI).await.unwrap_err();
    assert!(matches!(err, SyncError::Backend(_)));
    assert_eq!(screen.record(&task_id).unwrap().image_url, None);

    // Orphaned blob stays
    assert_eq!(t.backend.blobs.len(), 1);

    screen.close().await;
}

/// Detach clears the URL before the push
#[tokio::test]
async fn test_detach_merges_null_before_push() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;

    let url = screen.attach_image(&task_id, IMAGE_URI).await.unwrap();
    wait_for(|| !screen.has_pending_override(&task_id), 2)
        .await
        .unwrap();

    t.backend.documents.pause_pushes();
    screen.detach_image(&task_id, &url).await.unwrap();

    assert_eq!(screen.record(&task_id).unwrap().image_url, None);
    assert!(t.backend.blobs.is_empty());

    t.backend.documents.resume_pushes();
    wait_for(|| !screen.has_pending_override(&task_id), 2)
        .await
        .unwrap();
    assert_eq!(screen.record(&task_id).unwrap().image_url, None);

    screen.close().await;
}

/// A failed blob delete leaves the displayed URL and reports a backend error
#[tokio::test]
async fn test_detach_blob_delete_failure() {
    let mut t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;

    let url = screen.attach_image(&task_id, IMAGE_URI).await.unwrap();
    wait_for(|| !screen.has_pending_override(&task_id), 2)
        .await
        .unwrap();
    t.drain_notices();

    t.backend.faults.fail_next(FaultPoint::DeleteBlob);
    let err = screen.detach_image(&task_id, &url).await.unwrap_err();

    assert!(matches!(err, SyncError::Backend(_)));
    assert_eq!(screen.record(&task_id).unwrap().image_url, Some(url));
    assert_eq!(t.backend.blobs.len(), 1);

    let notices = t.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Could not remove the image.");

    screen.close().await;
}

/// A task can be created together with a picked image
#[tokio::test]
async fn test_submit_with_image() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");

    let screen = TaskScreen::open(&t.ctx, scope(), NoticeSink::discard()).unwrap();
    screen.set_draft_text("Photo task");

    let task_id = screen.submit_with_image(Some(IMAGE_URI)).await.unwrap();
    wait_for(
        || {
            screen
                .record(&task_id)
                .map(|task| task.image_url.is_some())
                .unwrap_or(false)
        },
        2,
    )
    .await
    .unwrap();

    assert_eq!(t.backend.blobs.len(), 1);
    screen.close().await;
}

/// A failed upload does not fail the submit
#[tokio::test]
async fn test_submit_with_unreadable_image_still_creates_task() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");

    let screen = TaskScreen::open(&t.ctx, scope(), NoticeSink::discard()).unwrap();
    screen.set_draft_text("Photo task");

    let task_id = screen
        .submit_with_image(Some("file:///photos/missing.jpg"))
        .await
        .unwrap();
    wait_for(|| screen.record(&task_id).is_some(), 2).await.unwrap();

    assert_eq!(screen.record(&task_id).unwrap().image_url, None);
    assert!(screen.draft().text.is_empty());
    assert!(t.backend.blobs.is_empty());

    screen.close().await;
}

/// A confirming push that lands before the local merge leaves nothing pending
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_attach_confirmed_before_merge_is_not_pending() {
    let t = TestContext::new().unwrap();
    t.sign_in("u1@example.com");
    let (screen, task_id) = screen_with_task(&t).await;

    for _ in 0..50 {
        let url = screen.attach_image(&task_id, IMAGE_URI).await.unwrap();

        wait_for(
            || {
                !screen.has_pending_override(&task_id)
                    && screen.record(&task_id).and_then(|task| task.image_url) == Some(url.clone())
            },
            2,
        )
        .await
        .unwrap();

        // Distinct upload timestamps per round
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    screen.close().await;
}
