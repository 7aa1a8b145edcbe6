use crate::{
    data::{Registration, StudentId, StudentRecord},
    error::{GradRegError, GradRegResult, StudentNotFoundSnafu},
    store::{RecordStore, StoreTransaction},
};
use async_trait::async_trait;
use jiff::Timestamp;
use snafu::OptionExt;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Students = HashMap<StudentId, StudentRecord>;

/// An in-process store where a transaction holds the whole table until it ends.
#[derive(Clone, Debug)]
pub struct MemoryRecordStore {
    students: Arc<Mutex<Students>>,
    transaction_attempts: u32,
    conflicts_to_inject: Arc<AtomicU32>,
    outages_to_inject: Arc<AtomicU32>,
    commits: Arc<AtomicU32>,
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl MemoryRecordStore {
    pub fn new(records: impl IntoIterator<Item = StudentRecord>) -> Self {
        Self {
            students: Arc::new(Mutex::new(
                records
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect(),
            )),
            transaction_attempts: 5,
            conflicts_to_inject: Arc::default(),
            outages_to_inject: Arc::default(),
            commits: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_transaction_attempts(mut self, attempts: u32) -> Self {
        self.transaction_attempts = attempts;
        self
    }

    /// The next `n` transactions fail to commit with a write conflict.
    pub fn inject_conflicts(&self, n: u32) {
        self.conflicts_to_inject.store(n, Ordering::SeqCst);
    }

    /// The next `n` reads or transaction begins fail with [`GradRegError::StoreUnavailable`].
    pub fn inject_outages(&self, n: u32) {
        self.outages_to_inject.store(n, Ordering::SeqCst);
    }

    fn check_available(&self) -> GradRegResult<()> {
        if take_one(&self.outages_to_inject) {
            return Err(GradRegError::StoreUnavailable);
        }
        Ok(())
    }

    pub fn commits(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self, id: &str) -> Option<StudentRecord> {
        let id = StudentId::parse(id).ok()?;
        self.students.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    type Transaction = MemoryTransaction;

    async fn get_student(&self, id: &StudentId) -> GradRegResult<Option<StudentRecord>> {
        self.check_available()?;
        Ok(self.students.lock().await.get(id).cloned())
    }

    async fn begin(&self) -> GradRegResult<Self::Transaction> {
        self.check_available()?;
        let conflict_on_commit = take_one(&self.conflicts_to_inject);

        Ok(MemoryTransaction {
            students: self.students.clone().lock_owned().await,
            staged: None,
            conflict_on_commit,
            commits: self.commits.clone(),
        })
    }

    fn transaction_attempts(&self) -> u32 {
        self.transaction_attempts
    }
}

pub struct MemoryTransaction {
    students: OwnedMutexGuard<Students>,
    staged: Option<(StudentId, Registration)>,
    conflict_on_commit: bool,
    commits: Arc<AtomicU32>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_student(&mut self, id: &StudentId) -> GradRegResult<Option<StudentRecord>> {
        let mut record = self.students.get(id).cloned();
        if let (Some(record), Some((staged_id, registration))) = (record.as_mut(), &self.staged) {
            if staged_id == id {
                record.registration = Some(registration.clone());
            }
        }
        Ok(record)
    }

    async fn mark_registered(&mut self, id: &StudentId, via: &str) -> GradRegResult<Timestamp> {
        self.students
            .get(id)
            .context(StudentNotFoundSnafu { id: id.as_str() })?;

        let at = Timestamp::now();
        self.staged = Some((
            id.clone(),
            Registration {
                at,
                via: via.to_string(),
            },
        ));
        Ok(at)
    }

    async fn commit(mut self) -> GradRegResult<()> {
        if self.conflict_on_commit {
            return Err(GradRegError::TransactionConflict);
        }

        if let Some((id, registration)) = self.staged.take() {
            if let Some(record) = self.students.get_mut(&id) {
                record.registration = Some(registration);
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> GradRegResult<()> {
        Ok(())
    }
}
