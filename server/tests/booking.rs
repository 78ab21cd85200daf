//! Double-booking validation for tables and players.

mod common;

use chrono::Duration;
use common::{at, booking, league, player};
use cue_league_server::db::models::{Booking, Match, MatchUpdate, NewMatch};
use cue_league_server::error::{ErrorKind, LeagueError};
use cue_league_server::league::booking::{find_conflict, BookingConflict};
use futures::future::join_all;

fn conflict_message(err: LeagueError) -> String {
    assert_eq!(err.kind(), ErrorKind::Conflict, "{err}");
    err.to_string()
}

#[tokio::test]
async fn overlapping_booking_on_same_table_is_rejected() {
    let league = league();
    let (x, y, z, w) = (
        player(&league, "X").await,
        player(&league, "Y").await,
        player(&league, "Z").await,
        player(&league, "W").await,
    );

    league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 5))
        .await
        .unwrap();

    let err = league
        .create_match(booking(z, w, at(10, 30), at(11, 30), 5))
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "table already booked");
    assert_eq!(league.matches(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn overlapping_booking_for_same_player_is_rejected() {
    let league = league();
    let (x, y, z) = (
        player(&league, "X").await,
        player(&league, "Y").await,
        player(&league, "Z").await,
    );

    league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 1))
        .await
        .unwrap();

    let err = league
        .create_match(booking(x, z, at(10, 30), at(11, 30), 2))
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "players already booked");

    // The second seat is checked too.
    let err = league
        .create_match(booking(z, y, at(10, 45), at(11, 15), 3))
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "players already booked");
}

#[tokio::test]
async fn nested_windows_conflict() {
    let league = league();
    let (x, y, z, w) = (
        player(&league, "X").await,
        player(&league, "Y").await,
        player(&league, "Z").await,
        player(&league, "W").await,
    );

    league
        .create_match(booking(x, y, at(9, 0), at(12, 0), 4))
        .await
        .unwrap();

    // Entirely inside the existing window: no endpoint of either falls
    // strictly between the other's, yet they overlap.
    let err = league
        .create_match(booking(z, w, at(10, 0), at(11, 0), 4))
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "table already booked");

    // And the other way around.
    let league = common::league();
    let (x, y, z, w) = (
        player(&league, "X").await,
        player(&league, "Y").await,
        player(&league, "Z").await,
        player(&league, "W").await,
    );
    league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 4))
        .await
        .unwrap();
    let err = league
        .create_match(booking(z, w, at(9, 0), at(12, 0), 4))
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "table already booked");
}

#[tokio::test]
async fn back_to_back_matches_share_a_table() {
    let league = league();
    let (x, y) = (player(&league, "X").await, player(&league, "Y").await);

    league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 1))
        .await
        .unwrap();
    league
        .create_match(booking(x, y, at(11, 0), at(12, 0), 1))
        .await
        .expect("windows touching at 11:00 do not overlap");
    assert_eq!(league.matches(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn self_match_is_a_validation_error() {
    let league = league();
    let x = player(&league, "X").await;

    let err = league
        .create_match(booking(x, x, at(10, 0), at(11, 0), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Regardless of whether the player exists at all.
    let err = league
        .create_match(booking(999, 999, at(10, 0), at(11, 0), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn unknown_players_are_reported_by_seat() {
    let league = league();
    let x = player(&league, "X").await;

    let err = league
        .create_match(booking(404, x, at(10, 0), at(11, 0), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "player1 does not exist");

    let err = league
        .create_match(booking(x, 404, at(10, 0), at(11, 0), 1))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "player2 does not exist");
}

#[tokio::test]
async fn missing_end_time_defaults_to_one_hour() {
    let league = league();
    let (x, y) = (player(&league, "X").await, player(&league, "Y").await);

    let id = league
        .create_match(NewMatch {
            player1_id: x,
            player2_id: y,
            start_time: at(14, 0),
            end_time: None,
            table_number: 3,
        })
        .await
        .unwrap();

    let m = league.match_by_id(id).await.unwrap();
    assert_eq!(m.end_time - m.start_time, Duration::hours(1));
    assert_eq!(m.winner_id, 0);
}

#[tokio::test]
async fn zero_end_time_defaults_to_one_hour() {
    let league = league();
    let (x, y) = (player(&league, "X").await, player(&league, "Y").await);

    let candidate: NewMatch = serde_json::from_value(serde_json::json!({
        "player1Id": x,
        "player2Id": y,
        "startTime": "2026-03-14T14:00:00Z",
        "endTime": "0001-01-01T00:00:00Z",
        "tableNumber": 3
    }))
    .unwrap();
    let id = league.create_match(candidate).await.unwrap();

    let m = league.match_by_id(id).await.unwrap();
    assert_eq!(m.start_time, at(14, 0));
    assert_eq!(m.end_time, at(15, 0));
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let league = league();
    let (x, y) = (player(&league, "X").await, player(&league, "Y").await);

    let err = league
        .create_match(booking(x, y, at(11, 0), at(10, 0), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn concurrent_overlapping_bookings_admit_exactly_one() {
    let league = league();
    let mut players = Vec::new();
    for i in 0..12 {
        players.push(player(&league, &format!("P{i}")).await);
    }

    // Six disjoint pairs all racing for table 9 at overlapping times.
    let attempts = players.chunks(2).enumerate().map(|(i, pair)| {
        let league = league.clone();
        let start = at(18, 0) + Duration::minutes(5 * i as i64);
        let candidate = booking(pair[0], pair[1], start, start + Duration::hours(1), 9);
        tokio::spawn(async move { league.create_match(candidate).await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert_eq!(league.matches(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rescheduling_checks_conflicts_but_ignores_itself() {
    let league = league();
    let (x, y, z, w) = (
        player(&league, "X").await,
        player(&league, "Y").await,
        player(&league, "Z").await,
        player(&league, "W").await,
    );
    let first = league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 1))
        .await
        .unwrap();
    league
        .create_match(booking(z, w, at(12, 0), at(13, 0), 1))
        .await
        .unwrap();

    // Sliding within its own slot overlaps only itself.
    let (moved, award) = league
        .update_match(
            first,
            MatchUpdate {
                start_time: Some(at(10, 15)),
                end_time: Some(at(11, 15)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.start_time, at(10, 15));
    assert!(award.is_none());

    // Moving into the other booking's slot is refused and leaves the row alone.
    let err = league
        .update_match(
            first,
            MatchUpdate {
                start_time: Some(at(12, 30)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(conflict_message(err), "table already booked");
    assert_eq!(league.match_by_id(first).await.unwrap().start_time, at(10, 15));

    // A new start without an end keeps the one-hour default.
    let (moved, _) = league
        .update_match(
            first,
            MatchUpdate {
                start_time: Some(at(15, 0)),
                table_number: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.end_time, at(16, 0));
    assert_eq!(moved.table_number, 2);
}

#[tokio::test]
async fn deleting_a_match_frees_its_slot() {
    let league = league();
    let (x, y) = (player(&league, "X").await, player(&league, "Y").await);
    let id = league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 1))
        .await
        .unwrap();

    league.delete_match(id).await.unwrap();
    assert_eq!(league.delete_match(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    league
        .create_match(booking(x, y, at(10, 0), at(11, 0), 1))
        .await
        .expect("slot is free again");
}

fn existing(id: i64, p1: i64, p2: i64, start: u32, end: u32, table: i32) -> Match {
    Match {
        id,
        player1_id: p1,
        player2_id: p2,
        start_time: at(start, 0),
        end_time: at(end, 0),
        winner_id: 0,
        table_number: table,
    }
}

#[test]
fn find_conflict_reports_table_before_players() {
    let rows = vec![existing(1, 1, 2, 10, 11, 5)];
    let candidate = Booking::resolve(1, 3, at(10, 30), Some(at(11, 30)), 5).unwrap();
    assert_eq!(
        find_conflict(&candidate, &rows, None),
        Some(BookingConflict::Table)
    );

    let candidate = Booking::resolve(1, 3, at(10, 30), Some(at(11, 30)), 6).unwrap();
    assert_eq!(
        find_conflict(&candidate, &rows, None),
        Some(BookingConflict::Players)
    );

    let candidate = Booking::resolve(3, 4, at(10, 30), Some(at(11, 30)), 6).unwrap();
    assert_eq!(find_conflict(&candidate, &rows, None), None);
}

#[test]
fn find_conflict_skips_the_excluded_match() {
    let rows = vec![existing(1, 1, 2, 10, 11, 5)];
    let candidate = Booking::resolve(1, 2, at(10, 0), Some(at(11, 0)), 5).unwrap();
    assert_eq!(find_conflict(&candidate, &rows, Some(1)), None);
    assert!(find_conflict(&candidate, &rows, Some(2)).is_some());
}
