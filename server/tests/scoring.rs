//! Scoring ledger: upset bonus, loser unchanged, one award per match.

mod common;

use common::{at, booking, league, player};
use cue_league_server::db::models::{MatchUpdate, PlayerId};
use cue_league_server::error::ErrorKind;
use cue_league_server::league::scoring::{points_for_win, UPSET_POINTS, WIN_POINTS};
use cue_league_server::league::League;

/// Play and score matches until `id` has `points` points.
async fn give_points(league: &League, id: PlayerId, points: i32, hour: &mut u32) {
    for _ in 0..points {
        let sparring = player(league, &format!("sparring {hour}")).await;
        let m = league
            .create_match(booking(id, sparring, at(*hour, 0), at(*hour + 1, 0), 99))
            .await
            .unwrap();
        league.record_result(m, id).await.unwrap();
        *hour += 1;
    }
}

#[test]
fn upset_is_worth_two_points() {
    assert_eq!(points_for_win(0, 2), UPSET_POINTS);
    assert_eq!(points_for_win(2, 0), WIN_POINTS);
    assert_eq!(points_for_win(3, 3), WIN_POINTS, "equal totals are no upset");
}

#[tokio::test]
async fn underdog_win_awards_upset_bonus() {
    let league = league();
    let x = player(&league, "X").await;
    let y = player(&league, "Y").await;
    let mut hour = 0;
    give_points(&league, y, 2, &mut hour).await;
    assert_eq!(league.player(y).await.unwrap().points, 2);

    let m = league
        .create_match(booking(x, y, at(20, 0), at(21, 0), 1))
        .await
        .unwrap();
    let award = league.record_result(m, x).await.unwrap();

    assert_eq!(award.points, 2);
    assert!(award.upset);
    assert_eq!(award.loser_id, y);
    assert_eq!(league.player(x).await.unwrap().points, 2);
    assert_eq!(league.player(y).await.unwrap().points, 2, "loser unchanged");
    assert_eq!(league.match_by_id(m).await.unwrap().winner_id, x);
}

#[tokio::test]
async fn favourite_win_awards_one_point() {
    let league = league();
    let x = player(&league, "X").await;
    let y = player(&league, "Y").await;
    let mut hour = 0;
    give_points(&league, x, 1, &mut hour).await;

    let m = league
        .create_match(booking(x, y, at(20, 0), at(21, 0), 1))
        .await
        .unwrap();
    let award = league.record_result(m, x).await.unwrap();

    assert_eq!(award.points, 1);
    assert!(!award.upset);
    assert_eq!(league.player(x).await.unwrap().points, 2);
    assert_eq!(league.player(y).await.unwrap().points, 0);
}

#[tokio::test]
async fn a_result_is_scored_once() {
    let league = league();
    let x = player(&league, "X").await;
    let y = player(&league, "Y").await;
    let m = league
        .create_match(booking(x, y, at(20, 0), at(21, 0), 1))
        .await
        .unwrap();

    league.record_result(m, y).await.unwrap();
    let err = league.record_result(m, y).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = league.record_result(m, x).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(league.player(y).await.unwrap().points, 1);
    assert_eq!(league.player(x).await.unwrap().points, 0);
}

#[tokio::test]
async fn winner_must_play_in_the_match() {
    let league = league();
    let x = player(&league, "X").await;
    let y = player(&league, "Y").await;
    let z = player(&league, "Z").await;
    let m = league
        .create_match(booking(x, y, at(20, 0), at(21, 0), 1))
        .await
        .unwrap();

    let err = league.record_result(m, z).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = league.record_result(m, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(league.match_by_id(m).await.unwrap().winner_id, 0);
    assert_eq!(league.player(z).await.unwrap().points, 0);
}

#[tokio::test]
async fn unknown_match_is_not_found() {
    let league = league();
    assert_eq!(
        league.record_result(77, 1).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn update_can_reschedule_and_score_together() {
    let league = league();
    let x = player(&league, "X").await;
    let y = player(&league, "Y").await;
    let m = league
        .create_match(booking(x, y, at(20, 0), at(21, 0), 1))
        .await
        .unwrap();

    let (updated, award) = league
        .update_match(
            m,
            MatchUpdate {
                end_time: Some(at(21, 30)),
                winner_id: Some(y),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.end_time, at(21, 30));
    assert_eq!(updated.winner_id, y);
    assert_eq!(award.map(|a| a.points), Some(1));
    assert_eq!(league.player(y).await.unwrap().points, 1);

    // Further schedule edits leave the score alone.
    let (_, award) = league
        .update_match(
            m,
            MatchUpdate {
                table_number: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(award.is_none());
    assert_eq!(league.player(y).await.unwrap().points, 1);
}
