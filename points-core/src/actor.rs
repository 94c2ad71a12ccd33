//! Actor-based concurrency for the points account
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the `Account`, so every operation has exclusive access
//! - A redemption sees one consistent raw history from normalization to
//!   the synthetic debits it appends
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 HTTP gateway (axum)                   │
//! │              Concurrent request tasks                 │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              AccountHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              AccountActor (Single Task)               │
//! │   Account { raw_history, clean_ledger }               │
//! │   one message at a time, start to finish              │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    account::Account,
    ledger::CleanLedger,
    metrics::Metrics,
    redemption::RedemptionPlan,
    types::{PayerAmounts, Transaction},
    Error, Result,
};
use chrono::Utc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the account actor
pub enum AccountMessage {
    /// Append a transaction
    AddTransaction {
        /// Transaction to record
        txn: Transaction,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Raw per-payer balances
    GetBalances {
        /// Reply channel
        response: oneshot::Sender<Result<PayerAmounts>>,
    },

    /// Rebuild and return the clean ledger
    Normalize {
        /// Reply channel
        response: oneshot::Sender<Result<CleanLedger>>,
    },

    /// Redeem points
    Redeem {
        /// Points to redeem
        points: i64,
        /// Reply channel
        response: oneshot::Sender<Result<RedemptionPlan>>,
    },

    /// Snapshot of the raw history
    GetHistory {
        /// Reply channel
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the account
pub struct AccountActor {
    /// The account itself
    account: Account,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<AccountMessage>,

    /// Prometheus metrics
    metrics: Metrics,
}

impl AccountActor {
    /// Create new actor
    pub fn new(account: Account, mailbox: mpsc::Receiver<AccountMessage>, metrics: Metrics) -> Self {
        Self {
            account,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        tracing::info!(transactions = self.account.len(), "Account actor started");

        while let Some(msg) = self.mailbox.recv().await {
            if let AccountMessage::Shutdown = msg {
                break;
            }
            self.handle_message(msg);
        }

        tracing::info!(transactions = self.account.len(), "Account actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: AccountMessage) {
        match msg {
            AccountMessage::AddTransaction { txn, response } => {
                let result = self.account.add_transaction(txn);
                match &result {
                    Ok(()) => self.metrics.record_transaction(),
                    Err(e) => tracing::warn!(error = %e, "Transaction rejected"),
                }
                let _ = response.send(result);
            }

            AccountMessage::GetBalances { response } => {
                let _ = response.send(self.account.balances());
            }

            AccountMessage::Normalize { response } => {
                let start = Instant::now();
                let result = self.account.normalize().cloned();
                self.metrics
                    .record_normalize_duration(start.elapsed().as_secs_f64());
                let _ = response.send(result);
            }

            AccountMessage::Redeem { points, response } => {
                let result = self.account.redeem_at(points, Utc::now());

                match &result {
                    Ok(plan) => self.metrics.record_redemption(plan.redeemed()),
                    Err(e) => {
                        tracing::warn!(points, error = %e, "Redemption rejected");
                        self.metrics.record_redemption_failure();
                    }
                }
                let _ = response.send(result);
            }

            AccountMessage::GetHistory { response } => {
                let _ = response.send(self.account.raw_history().to_vec());
            }

            AccountMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct AccountHandle {
    sender: mpsc::Sender<AccountMessage>,
}

impl AccountHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<AccountMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> AccountMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Append a transaction
    pub async fn add_transaction(&self, txn: Transaction) -> Result<()> {
        self.request(|response| AccountMessage::AddTransaction { txn, response })
            .await?
    }

    /// Raw per-payer balances
    pub async fn balances(&self) -> Result<PayerAmounts> {
        self.request(|response| AccountMessage::GetBalances { response })
            .await?
    }

    /// Rebuild and return the clean ledger
    pub async fn normalize(&self) -> Result<CleanLedger> {
        self.request(|response| AccountMessage::Normalize { response })
            .await?
    }

    /// Redeem points
    pub async fn redeem(&self, points: i64) -> Result<RedemptionPlan> {
        self.request(|response| AccountMessage::Redeem { points, response })
            .await?
    }

    /// Snapshot of the raw history
    pub async fn history(&self) -> Result<Vec<Transaction>> {
        self.request(|response| AccountMessage::GetHistory { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(AccountMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the account actor
pub fn spawn_account_actor(account: Account, capacity: usize, metrics: Metrics) -> AccountHandle {
    let (tx, rx) = mpsc::channel(capacity);
    let actor = AccountActor::new(account, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    AccountHandle::new(tx)
}
