//! Completion polling
//!
//! Submission only tells whether a transaction was accepted. The poller asks
//! `getTransaction` until the node reports anything other than `NOT_FOUND`,
//! sleeping `i * backoff` after attempt `i`. Running out of attempts is an
//! explicit [`Completion::Inconclusive`] outcome, not success or failure.

use std::time::Duration;

use crate::client::SorobanClient;
use crate::types::{GetTransactionResult, TransactionStatus};
use crate::{Error, Result};

/// Outcome of waiting for a submitted transaction
#[derive(Debug, Clone)]
pub enum Completion {
    /// The node reported a status other than `NOT_FOUND`
    Completed(GetTransactionResult),
    /// Every attempt returned `NOT_FOUND`
    Inconclusive { hash: String, attempts: u32 },
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Status when completed
    pub fn status(&self) -> Option<TransactionStatus> {
        match self {
            Self::Completed(result) => Some(result.status),
            Self::Inconclusive { .. } => None,
        }
    }

    /// Turn an inconclusive outcome into `Error::Inconclusive`
    pub fn into_result(self) -> Result<GetTransactionResult> {
        match self {
            Self::Completed(result) => Ok(result),
            Self::Inconclusive { hash, attempts } => Err(Error::Inconclusive { hash, attempts }),
        }
    }
}

/// Bounded `getTransaction` polling with linear backoff
#[derive(Debug, Clone)]
pub struct CompletionPoller {
    client: SorobanClient,
    backoff: Duration,
}

impl CompletionPoller {
    /// Poller using the client's configured backoff step
    pub fn new(client: SorobanClient) -> Self {
        let backoff = client.config().poll_backoff;
        Self { client, backoff }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sleep after attempt `attempt` (0-based), saturating at `Duration::MAX`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Wait for a transaction to leave `NOT_FOUND`
    ///
    /// # Arguments
    /// * `hash` - Transaction hash (hex)
    /// * `max_attempts` - Number of `getTransaction` queries to make at most
    ///
    /// # Returns
    /// `Completion::Completed` as soon as the node knows the transaction,
    /// `Completion::Inconclusive` after `max_attempts` queries otherwise.
    /// RPC errors are returned immediately and are not retried.
    pub async fn wait(&self, hash: &str, max_attempts: u32) -> Result<Completion> {
        log::info!("⏳ Waiting for transaction {} (max {} attempts)", hash, max_attempts);

        for attempt in 0..max_attempts {
            let result = self.client.get_transaction(hash).await?;

            if result.status != TransactionStatus::NotFound {
                log::info!(
                    "   ✓ Transaction {} finished after {} attempt(s): {:?}",
                    hash,
                    attempt + 1,
                    result.status
                );
                return Ok(Completion::Completed(result));
            }

            log::debug!("   Attempt {}/{}: not found yet", attempt + 1, max_attempts);
            if attempt + 1 < max_attempts {
                tokio::time::sleep(self.delay_after(attempt)).await;
            }
        }

        log::warn!(
            "⚠️  Transaction {} still not found after {} attempts",
            hash,
            max_attempts
        );
        Ok(Completion::Inconclusive {
            hash: hash.to_string(),
            attempts: max_attempts,
        })
    }

    /// [`wait`](Self::wait) bounded by a wall-clock deadline
    pub async fn wait_with_deadline(
        &self,
        hash: &str,
        max_attempts: u32,
        deadline: Duration,
    ) -> Result<Completion> {
        tokio::time::timeout(deadline, self.wait(hash, max_attempts))
            .await
            .map_err(|_| {
                log::error!("   ❌ Deadline of {:?} elapsed waiting for {}", deadline, hash);
                Error::Timeout {
                    hash: hash.to_string(),
                }
            })?
    }
}
