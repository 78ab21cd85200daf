//! Booking & scoring engine.
//!
//! [`League`] owns the store handle and the transaction deadline. The
//! decision procedures live in the submodules:
//!
//! * [`ranking`] – player lifecycle and the unique-ranking guard
//! * [`booking`] – double-booking validation for new and rescheduled matches
//! * [`status`]  – upcoming / ongoing / finished classification
//! * [`scoring`] – points awarded when a result is recorded

pub mod booking;
pub mod ranking;
pub mod scoring;
pub mod status;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::db::store::{Store, StoreTx};
use crate::error::LeagueError;

pub use scoring::Award;
pub use status::MatchStatus;

pub struct League {
    store: Arc<dyn Store>,
    tx_timeout: Duration,
}

impl League {
    pub fn new(store: Arc<dyn Store>, tx_timeout: Duration) -> Self {
        League { store, tx_timeout }
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    /// Run `work` under the transaction deadline. Expiry drops the pending
    /// transaction, which rolls it back.
    async fn within_deadline<T, F>(&self, work: F) -> Result<T, LeagueError>
    where
        F: Future<Output = Result<T, LeagueError>>,
    {
        match tokio::time::timeout(self.tx_timeout, work).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("transaction exceeded its {:?} deadline", self.tx_timeout);
                Err(LeagueError::Internal("transaction deadline exceeded".into()))
            }
        }
    }
}

/// Commit on success, roll back and hand the original error back otherwise.
async fn finish<T>(tx: Box<dyn StoreTx>, outcome: Result<T, LeagueError>) -> Result<T, LeagueError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                log::warn!("rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}
