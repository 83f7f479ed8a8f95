//! Regression coverage for the attendance roster service.

use std::sync::Arc;

use mockall::predicate::{always, eq};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{MockAttendanceGateway, MockNotifier, Notification};

use AttendanceStatus::{Absent, Pending, Present};

fn id(raw: i64) -> EnrollmentId {
    EnrollmentId::new(raw).expect("positive id")
}

#[fixture]
fn session() -> SessionId {
    SessionId::parse("6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50").expect("valid session id")
}

fn three_entries(session: SessionId) -> Vec<RosterEntry> {
    vec![
        RosterEntry::new(id(1), session, "Ada", Pending),
        RosterEntry::new(id(2), session, "Bo", Pending),
        RosterEntry::new(id(3), session, "Cy", Present),
    ]
}

fn gateway_with_roster(entries: Vec<RosterEntry>) -> MockAttendanceGateway {
    let mut gateway = MockAttendanceGateway::new();
    gateway
        .expect_fetch_roster()
        .times(1)
        .returning(move |_| Ok(entries.clone()));
    gateway
}

fn quiet() -> Arc<MockNotifier> {
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().never();
    Arc::new(notifier)
}

async fn loaded_service(
    session: SessionId,
    gateway: MockAttendanceGateway,
    notifier: Arc<MockNotifier>,
) -> AttendanceService<MockAttendanceGateway> {
    let service = AttendanceService::new(session, Arc::new(gateway), notifier);
    service.load().await.expect("roster loads");
    service
}

#[rstest]
#[tokio::test]
async fn load_keeps_only_this_sessions_rows(session: SessionId) {
    let mut entries = three_entries(session);
    entries.push(RosterEntry::new(id(9), SessionId::random(), "Stray", Pending));
    let service = AttendanceService::new(session, Arc::new(gateway_with_roster(entries)), quiet());

    let count = service.load().await.expect("roster loads");

    assert_eq!(count, 3);
    assert_eq!(service.roster(), three_entries(session));
}

#[rstest]
#[case(AttendanceGatewayError::timeout("30s elapsed"), ErrorCode::ServiceUnavailable)]
#[case(AttendanceGatewayError::transport("dns failure"), ErrorCode::ServiceUnavailable)]
#[case(AttendanceGatewayError::unauthorized("jwt expired"), ErrorCode::Unauthorized)]
#[case(AttendanceGatewayError::decode("missing id"), ErrorCode::InternalError)]
#[tokio::test]
async fn load_failures_map_to_domain_errors(
    session: SessionId,
    #[case] failure: AttendanceGatewayError,
    #[case] expected: ErrorCode,
) {
    let mut gateway = MockAttendanceGateway::new();
    gateway
        .expect_fetch_roster()
        .times(1)
        .returning(move |_| Err(failure.clone()));
    let service = AttendanceService::new(session, Arc::new(gateway), quiet());

    let err = service.load().await.expect_err("load must fail");

    assert_eq!(err.code(), expected);
    assert_eq!(
        err.details().and_then(|details| details.get("session")),
        Some(&json!(session.to_string()))
    );
    assert!(service.roster().is_empty());
}

#[rstest]
#[tokio::test]
async fn rejected_load_records_backend_status(session: SessionId) {
    let mut gateway = MockAttendanceGateway::new();
    gateway
        .expect_fetch_roster()
        .times(1)
        .returning(|_| Err(AttendanceGatewayError::rejected(400_u16, "bad filter")));
    let service = AttendanceService::new(session, Arc::new(gateway), quiet());

    let err = service.load().await.expect_err("load must fail");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(
        err.details(),
        Some(&json!({ "session": session.to_string(), "status": 400 }))
    );
}

#[rstest]
#[tokio::test]
async fn confirmed_mark_persists_requested_status(session: SessionId) {
    let mut gateway = gateway_with_roster(three_entries(session));
    gateway
        .expect_record_status()
        .with(eq(id(2)), eq(Present))
        .times(1)
        .returning(|_, _| Ok(()));
    let service = loaded_service(session, gateway, quiet()).await;

    let settlement = service.mark(id(2), Present).await.expect("entry exists");

    assert_eq!(settlement, Settlement::Confirmed);
    assert_eq!(
        service.roster(),
        vec![
            RosterEntry::new(id(1), session, "Ada", Pending),
            RosterEntry::new(id(2), session, "Bo", Present),
            RosterEntry::new(id(3), session, "Cy", Present),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn rejected_mark_restores_roster_and_names_the_entry(session: SessionId) {
    let mut gateway = gateway_with_roster(three_entries(session));
    gateway
        .expect_record_status()
        .with(eq(id(2)), always())
        .times(1)
        .returning(|_, _| Err(AttendanceGatewayError::rejected(409_u16, "row locked")));
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|note: &Notification| {
            note.subject() == "2" && note.message().starts_with("attendance update for 2")
        })
        .times(1)
        .return_const(());
    let service = loaded_service(session, gateway, Arc::new(notifier)).await;

    let settlement = service.mark(id(2), Present).await.expect("entry exists");

    assert_eq!(settlement, Settlement::RolledBack);
    assert_eq!(service.roster(), three_entries(session));
}

#[rstest]
#[tokio::test]
async fn marking_unknown_entry_never_reaches_backend(session: SessionId) {
    let mut gateway = gateway_with_roster(three_entries(session));
    gateway.expect_record_status().never();
    let service = loaded_service(session, gateway, quiet()).await;

    let err = service
        .mark(id(77), Absent)
        .await
        .expect_err("unknown entry must fail");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.details(), Some(&json!({ "key": "77" })));
}

#[rstest]
#[tokio::test]
async fn mark_all_only_reverts_the_failed_write(session: SessionId) {
    let entries: Vec<_> = (1..=5)
        .map(|raw| RosterEntry::new(id(raw), session, format!("athlete {raw}"), Pending))
        .collect();
    let mut gateway = gateway_with_roster(entries);
    gateway
        .expect_record_status()
        .times(5)
        .returning(|entry, _| {
            if entry.get() == 3 {
                Err(AttendanceGatewayError::timeout("gateway timeout"))
            } else {
                Ok(())
            }
        });
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|note: &Notification| note.subject() == "3")
        .times(1)
        .return_const(());
    let service = loaded_service(session, gateway, Arc::new(notifier)).await;

    let report = service.mark_all(Present).await;

    assert_eq!(report.rolled_back, vec![id(3)]);
    assert_eq!(report.confirmed.len(), 4);
    let statuses: Vec<_> = service
        .roster()
        .iter()
        .map(|entry| (entry.id().get(), entry.status()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (1, Present),
            (2, Present),
            (3, Pending),
            (4, Present),
            (5, Present)
        ]
    );
}

#[rstest]
#[tokio::test]
async fn mark_all_skips_rows_already_at_target(session: SessionId) {
    let mut gateway = gateway_with_roster(three_entries(session));
    gateway
        .expect_record_status()
        .with(always(), eq(Present))
        .times(2)
        .returning(|_, _| Ok(()));
    let service = loaded_service(session, gateway, quiet()).await;

    let report = service.mark_all(Present).await;

    assert_eq!(report.confirmed, vec![id(1), id(2)]);
    assert_eq!(report.failed(), 0);
}

#[rstest]
#[tokio::test]
async fn realtime_changes_for_other_sessions_are_ignored(session: SessionId) {
    let service = loaded_service(session, gateway_with_roster(three_entries(session)), quiet()).await;

    let foreign = RosterEntry::new(id(2), SessionId::random(), "Bo", Absent);
    assert!(!service.apply_change(ChangeEvent::Updated(foreign)));
    assert_eq!(service.roster(), three_entries(session));

    let own = RosterEntry::new(id(2), session, "Bo", Absent);
    assert!(service.apply_change(ChangeEvent::Updated(own.clone())));
    assert!(service.apply_change(ChangeEvent::Deleted(id(1))));
    assert_eq!(
        service.roster(),
        vec![own, RosterEntry::new(id(3), session, "Cy", Present)]
    );
}
