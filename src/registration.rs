use crate::{
    data::{Registration, StudentId, StudentRecord},
    error::{GradRegResult, StudentNotFoundSnafu},
    store::{RecordStore, StoreTransaction, run_transaction},
};
use snafu::OptionExt;

/// Fetches a student by ID. Never writes.
pub async fn lookup<S: RecordStore>(store: &S, raw_id: &str) -> GradRegResult<StudentRecord> {
    let id = StudentId::parse(raw_id)?;
    store
        .get_student(&id)
        .await?
        .context(StudentNotFoundSnafu { id: id.as_str() })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(Registration),
    NotFound,
    SeatMismatch,
    AlreadyRegistered,
}

/// Flips `registered` for a student, at most once ever, if `expected_seat_num` matches the stored
/// seat.
///
/// Every check runs against a fresh read inside a store transaction, so whatever the caller looked
/// up earlier is irrelevant. Rejections are not retried; write conflicts are retried by
/// [`run_transaction`] and surface as [`StoreUnavailable`](crate::error::GradRegError::StoreUnavailable)
/// once the store's attempts run out.
pub async fn register<S: RecordStore>(
    store: &S,
    raw_id: &str,
    expected_seat_num: i32,
    via: &str,
) -> GradRegResult<RegistrationOutcome> {
    let id = StudentId::parse(raw_id)?;
    let id = &id;

    run_transaction(store.transaction_attempts(), move || {
        attempt_registration(store, id, expected_seat_num, via)
    })
    .await
}

async fn attempt_registration<S: RecordStore>(
    store: &S,
    id: &StudentId,
    expected_seat_num: i32,
    via: &str,
) -> GradRegResult<RegistrationOutcome> {
    let mut txn = store.begin().await?;

    let outcome = match txn.get_student(id).await? {
        None => RegistrationOutcome::NotFound,
        Some(record) if record.seat_num != expected_seat_num => RegistrationOutcome::SeatMismatch,
        Some(record) if record.is_registered() => RegistrationOutcome::AlreadyRegistered,
        Some(_) => {
            let at = txn.mark_registered(id, via).await?;
            txn.commit().await?;

            info!(%id, via, "Student registered");
            return Ok(RegistrationOutcome::Registered(Registration {
                at,
                via: via.to_string(),
            }));
        }
    };

    debug!(%id, ?outcome, "Registration rejected");
    if let Err(e) = txn.rollback().await {
        //nothing was written, so the rejection still stands
        warn!(?e, "Error rolling back rejected registration");
    }
    Ok(outcome)
}
