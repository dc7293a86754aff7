use super::common::*;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::approvals::domain::ActivityId;
use crate::workflows::notifications::domain::{NewNotification, NotificationId, NotificationKind};
use crate::workflows::notifications::inbox::{NotificationInbox, MAX_PAGE_SIZE};
use crate::workflows::notifications::memory::InMemoryNotificationStore;
use crate::workflows::notifications::repository::{NotificationRepository, NotificationStoreError};
use crate::workflows::notifications::router::notification_router;

fn seeded_inbox() -> (NotificationInbox<InMemoryNotificationStore>, InMemoryNotificationStore) {
    let store = InMemoryNotificationStore::default();
    for (recipient, title) in [
        ("membership.10", "Approval needed: Sunday Worship"),
        ("organization.5_group.PKB", "New service: Sunday Worship"),
        ("membership.10", "Approval needed: Youth retreat"),
        ("membership.20", "Approval needed: Youth retreat"),
    ] {
        store
            .insert(
                NewNotification::new(NotificationKind::ApprovalRequired, recipient, title, "")
                    .for_activity(ActivityId(1_001)),
            )
            .expect("insert");
    }
    (NotificationInbox::new(Arc::new(store.clone())), store)
}

#[test]
fn stored_rows_round_trip_with_their_fields() {
    let store = InMemoryNotificationStore::default();
    let stored = store
        .insert(
            NewNotification::new(
                NotificationKind::ApprovalConfirmed,
                "membership.99",
                "Activity approved: Sunday Worship",
                "Grace approved \"Sunday Worship\"",
            )
            .for_activity(ActivityId(1_001)),
        )
        .expect("insert");

    let fetched = store.fetch(stored.id).expect("fetch").expect("row exists");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.kind, NotificationKind::ApprovalConfirmed);
    assert_eq!(fetched.recipient, "membership.99");
    assert!(!fetched.is_read);
    assert_eq!(fetched.dedupe_key, None);
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[test]
fn listing_is_newest_first_and_scoped_to_recipients() {
    let (inbox, _store) = seeded_inbox();

    let rows = inbox
        .list(&["membership.10".to_string()], None)
        .expect("list");

    let titles: Vec<_> = rows.iter().map(|row| row.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Approval needed: Youth retreat",
            "Approval needed: Sunday Worship"
        ]
    );
}

#[test]
fn listing_honours_the_limit_and_empty_recipient_sets() {
    let (inbox, _store) = seeded_inbox();
    let recipients = vec![
        "membership.10".to_string(),
        "organization.5_group.PKB".to_string(),
    ];

    assert_eq!(inbox.list(&recipients, Some(2)).expect("list").len(), 2);
    assert_eq!(inbox.list(&recipients, Some(0)).expect("list").len(), 1);
    assert_eq!(
        inbox
            .list(&recipients, Some(MAX_PAGE_SIZE * 10))
            .expect("list")
            .len(),
        3
    );
    assert!(inbox.list(&[], None).expect("list").is_empty());
}

#[test]
fn mark_read_is_monotonic() {
    let (inbox, _store) = seeded_inbox();
    let first = inbox.get(NotificationId(1)).expect("row exists");

    let read = inbox.mark_read(first.id).expect("mark read");
    assert!(read.is_read);
    assert!(read.updated_at >= first.updated_at);

    let again = inbox.mark_read(first.id).expect("mark read twice");
    assert!(again.is_read);
    assert_eq!(again.updated_at, read.updated_at);

    assert_eq!(
        inbox.mark_read(NotificationId(999)),
        Err(NotificationStoreError::NotFound)
    );
}

#[tokio::test]
async fn list_route_splits_the_recipient_query() {
    let (inbox, _store) = seeded_inbox();
    let router = notification_router(Arc::new(inbox));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/notifications?recipients=membership.20,%20organization.5_group.PKB&limit=10")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let recipients: Vec<_> = body
        .as_array()
        .expect("array payload")
        .iter()
        .map(|row| row["recipient"].clone())
        .collect();
    assert_eq!(
        recipients,
        vec![json!("membership.20"), json!("organization.5_group.PKB")]
    );
    assert_eq!(body[0]["type"], json!("APPROVAL_REQUIRED"));
    assert_eq!(body[0]["isRead"], json!(false));
    assert_eq!(body[0]["activityId"], json!(1001));
}

#[tokio::test]
async fn read_route_marks_rows_and_reports_missing_ones() {
    let (inbox, store) = seeded_inbox();
    let router = notification_router(Arc::new(inbox));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/notifications/2/read")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["isRead"], json!(true));
    assert!(store
        .fetch(NotificationId(2))
        .expect("fetch")
        .is_some_and(|row| row.is_read));

    let missing = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/notifications/404/read")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
