//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use cue_league_server::db::models::{NewMatch, NewPlayer, PlayerId};
use cue_league_server::db::MemoryStore;
use cue_league_server::league::League;

pub fn league() -> Arc<League> {
    Arc::new(League::new(
        Arc::new(MemoryStore::new()),
        Duration::from_secs(5),
    ))
}

/// 14 March 2026 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
}

pub async fn player(league: &League, name: &str) -> PlayerId {
    league
        .create_player(NewPlayer::new(name, 0))
        .await
        .expect("create player")
}

pub fn booking(
    p1: PlayerId,
    p2: PlayerId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    table: i32,
) -> NewMatch {
    NewMatch {
        player1_id: p1,
        player2_id: p2,
        start_time: start,
        end_time: Some(end),
        table_number: table,
    }
}
