//! Tournament backend for a cue-sports league: players, table bookings,
//! rankings and match scoring.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod league;
pub mod metrics;
pub mod storage;
