use crate::{
    data::{StudentId, StudentRecord},
    error::{GradRegError, GradRegResult},
};
use async_trait::async_trait;
use jiff::Timestamp;
use std::future::Future;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Keyed student records plus a transaction primitive with serialisable access to a record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Transaction: StoreTransaction;

    /// Point read, outside of any transaction.
    async fn get_student(&self, id: &StudentId) -> GradRegResult<Option<StudentRecord>>;

    async fn begin(&self) -> GradRegResult<Self::Transaction>;

    /// How many times [`run_transaction`] attempts a body that keeps hitting write conflicts.
    fn transaction_attempts(&self) -> u32;
}

/// Dropping a transaction without committing it must discard everything it staged.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reads a record, and holds it so no other transaction can change it until this one ends.
    async fn get_student(&mut self, id: &StudentId) -> GradRegResult<Option<StudentRecord>>;

    /// Stages `registered = true`, `registered_at = <server time>`, `registered_via = via`,
    /// returning the server time used.
    async fn mark_registered(&mut self, id: &StudentId, via: &str) -> GradRegResult<Timestamp>;

    async fn commit(self) -> GradRegResult<()>;

    async fn rollback(self) -> GradRegResult<()>;
}

/// Runs `body` until it finishes without a write conflict, for at most `attempts` attempts.
///
/// `body` is expected to begin, and then either commit or roll back, its own transaction.
pub async fn run_transaction<T, F, Fut>(attempts: u32, mut body: F) -> GradRegResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GradRegResult<T>>,
{
    for attempt in 1..=attempts.max(1) {
        match body().await {
            Err(e) if e.is_conflict() => {
                warn!(attempt, attempts, "Write conflict in transaction, retrying");
            }
            other => return other,
        }
    }

    error!(attempts, "Ran out of transaction attempts");
    Err(GradRegError::StoreUnavailable)
}
