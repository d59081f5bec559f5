// crab-floor/tests/reservation_book.rs
// Reservation list and cancellation flow

mod common;

use std::sync::Arc;

use common::*;
use crab_floor::{
    FloorError, FloorEvent, RefreshStatus, ReservationBook, ReservationStatus, TransitionOutcome,
};
use tokio::sync::broadcast;

fn book_with(statuses: &[ReservationStatus]) -> (Arc<FakeFloorApi>, ReservationBook) {
    let reservations = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let mut r = reservation(i as i64 + 1, "M03", day(), "19:00");
            r.status = *status;
            r
        })
        .collect();
    let api = FakeFloorApi::new(floor_tables(), reservations);
    let (events, _) = broadcast::channel(16);
    let book = ReservationBook::new(api.clone(), events);
    (api, book)
}

fn status_of(reservations: &[crab_floor::Reservation], id: i64) -> ReservationStatus {
    reservations.iter().find(|r| r.id == id).unwrap().status
}

#[tokio::test]
async fn test_refresh_and_status_filter() {
    let (api, book) = book_with(&[ReservationStatus::Pending, ReservationStatus::Completed]);

    assert_eq!(book.refresh().await, Ok(RefreshStatus::Applied));
    assert_eq!(book.reservations().await.len(), 2);

    book.set_status_filter(Some(ReservationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(book.status_filter().await, Some(ReservationStatus::Pending));
    let listed = book.reservations().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);

    let query = api.reservation_queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(query.status, Some(ReservationStatus::Pending));
    assert_eq!(query.date, None);
}

#[tokio::test]
async fn test_refresh_failure_keeps_list() {
    let (api, book) = book_with(&[ReservationStatus::Pending]);
    book.refresh().await.unwrap();

    api.fail(&api.fail_fetch_reservations, true);
    assert!(book.refresh().await.is_err());
    assert_eq!(book.reservations().await.len(), 1);
}

#[tokio::test]
async fn test_cancel_pending_reservation() {
    let (api, book) = book_with(&[ReservationStatus::Pending]);
    book.refresh().await.unwrap();

    let outcome = book.cancel(1).await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Success);
    assert_eq!(
        api.reservation_updates(),
        vec![(1, ReservationStatus::Cancelled)]
    );
    assert_eq!(
        status_of(&book.reservations().await, 1),
        ReservationStatus::Cancelled
    );
}

#[tokio::test]
async fn test_cancel_rejects_non_pending_and_unknown() {
    let (api, book) = book_with(&[ReservationStatus::Active, ReservationStatus::Cancelled]);
    book.refresh().await.unwrap();

    assert_eq!(
        book.cancel(1).await.unwrap_err(),
        FloorError::NotCancellable {
            id: 1,
            status: ReservationStatus::Active,
        }
    );
    assert!(matches!(
        book.cancel(2).await,
        Err(FloorError::NotCancellable { id: 2, .. })
    ));
    assert_eq!(
        book.cancel(42).await.unwrap_err(),
        FloorError::UnknownReservation(42)
    );
    assert!(api.reservation_updates().is_empty());
}

#[tokio::test]
async fn test_cancel_remote_failure_changes_nothing() {
    let (api, book) = book_with(&[ReservationStatus::Pending]);
    book.refresh().await.unwrap();
    let before = book.reservations().await;

    api.fail(&api.fail_set_reservation_status, true);
    let outcome = book.cancel(1).await.unwrap();

    assert!(matches!(outcome, TransitionOutcome::RemoteUpdateFailed { .. }));
    assert_eq!(book.reservations().await, before);
    // no longer in flight, a retry reaches the backend again
    api.fail(&api.fail_set_reservation_status, false);
    assert_eq!(book.cancel(1).await.unwrap(), TransitionOutcome::Success);
    assert_eq!(api.reservation_updates().len(), 2);
}

#[tokio::test]
async fn test_cancel_with_failed_refresh_marks_locally() {
    let (api, book) = book_with(&[ReservationStatus::Pending, ReservationStatus::Pending]);
    book.refresh().await.unwrap();

    api.fail(&api.fail_fetch_reservations, true);
    let outcome = book.cancel(2).await.unwrap();

    assert!(matches!(
        outcome,
        TransitionOutcome::RefreshAfterUpdateFailed { .. }
    ));
    assert!(outcome.is_saved());
    let listed = book.reservations().await;
    assert_eq!(status_of(&listed, 2), ReservationStatus::Cancelled);
    assert_eq!(status_of(&listed, 1), ReservationStatus::Pending);
}

#[tokio::test]
async fn test_duplicate_cancel_is_rejected() {
    let (api, book) = book_with(&[ReservationStatus::Pending]);
    book.refresh().await.unwrap();
    let book = Arc::new(book);
    let release = api.hold_next_reservation_update();

    let first = tokio::spawn({
        let book = Arc::clone(&book);
        async move { book.cancel(1).await }
    });
    wait_until(|| api.reservation_updates().len() == 1).await;

    assert_eq!(
        book.cancel(1).await.unwrap_err(),
        FloorError::CancellationInFlight(1)
    );

    release.send(()).unwrap();
    assert_eq!(first.await.unwrap().unwrap(), TransitionOutcome::Success);
    assert_eq!(api.reservation_updates().len(), 1);
}

#[tokio::test]
async fn test_cancel_broadcasts_outcome() {
    let api = FakeFloorApi::new(
        floor_tables(),
        vec![reservation(7, "M01", day(), "13:30")],
    );
    let (events, mut rx) = broadcast::channel(16);
    let book = ReservationBook::new(api.clone(), events);
    book.refresh().await.unwrap();

    book.cancel(7).await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert!(received.contains(&FloorEvent::ReservationCancel {
        reservation_id: 7,
        outcome: TransitionOutcome::Success,
    }));
}
