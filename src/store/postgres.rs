use crate::{
    data::{Registration, StudentId, StudentRecord},
    error::{
        GradRegError, GradRegResult, InconsistentRecordSnafu, InvalidTimestampSnafu,
        MigrateSnafu, OpenDatabaseSnafu,
    },
    store::{RecordStore, StoreTransaction},
};
use async_trait::async_trait;
use jiff::Timestamp;
use snafu::{OptionExt, ResultExt};
use sqlx::{PgConnection, Pool, Postgres, Transaction, postgres::PgPoolOptions};
use time::OffsetDateTime;

const SELECT_STUDENT: &str = "SELECT student_id, name, course, award, image_path, seat_num, registered, registered_at, registered_via FROM public.students WHERE student_id = $1";

fn query_error(source: sqlx::Error) -> GradRegError {
    GradRegError::from_store(source, |source| GradRegError::MakeQuery { source })
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    student_id: String,
    name: String,
    course: String,
    award: String,
    image_path: Option<String>,
    seat_num: i32,
    registered: bool,
    registered_at: Option<OffsetDateTime>,
    registered_via: Option<String>,
}

fn to_timestamp(odt: OffsetDateTime) -> GradRegResult<Timestamp> {
    Timestamp::from_nanosecond(odt.unix_timestamp_nanos()).context(InvalidTimestampSnafu)
}

impl TryFrom<StudentRow> for StudentRecord {
    type Error = GradRegError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let registration = if row.registered {
            let at = row.registered_at.context(InconsistentRecordSnafu {
                id: row.student_id.clone(),
            })?;
            let via = row.registered_via.context(InconsistentRecordSnafu {
                id: row.student_id.clone(),
            })?;
            Some(Registration {
                at: to_timestamp(at)?,
                via,
            })
        } else {
            None
        };

        Ok(Self {
            id: StudentId::parse(&row.student_id)?,
            name: row.name,
            course: row.course,
            award: row.award,
            image_path: row.image_path.filter(|path| !path.is_empty()),
            seat_num: row.seat_num,
            registration,
        })
    }
}

async fn fetch_student(
    id: &StudentId,
    query: &str,
    conn: &mut PgConnection,
) -> GradRegResult<Option<StudentRecord>> {
    sqlx::query_as::<_, StudentRow>(query)
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(query_error)?
        .map(StudentRecord::try_from)
        .transpose()
}

/// The `students` table.
#[derive(Clone, Debug)]
pub struct PostgresRecordStore {
    pool: Pool<Postgres>,
    transaction_attempts: u32,
}

impl PostgresRecordStore {
    pub async fn new(
        options: PgPoolOptions,
        db_path: &str,
        transaction_attempts: u32,
    ) -> GradRegResult<Self> {
        let pool = options.connect(db_path).await.context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self::from_pool(pool, transaction_attempts))
    }

    /// Wraps a pool whose schema is already migrated.
    pub const fn from_pool(pool: Pool<Postgres>, transaction_attempts: u32) -> Self {
        Self {
            pool,
            transaction_attempts,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    type Transaction = PostgresTransaction;

    async fn get_student(&self, id: &StudentId) -> GradRegResult<Option<StudentRecord>> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            GradRegError::from_store(e, |source| GradRegError::GetDatabaseConnection { source })
        })?;
        fetch_student(id, SELECT_STUDENT, &mut *conn).await
    }

    async fn begin(&self) -> GradRegResult<Self::Transaction> {
        let txn = self.pool.begin().await.map_err(|e| {
            GradRegError::from_store(e, |source| GradRegError::BeginTransaction { source })
        })?;
        Ok(PostgresTransaction { txn })
    }

    fn transaction_attempts(&self) -> u32 {
        self.transaction_attempts
    }
}

pub struct PostgresTransaction {
    txn: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn get_student(&mut self, id: &StudentId) -> GradRegResult<Option<StudentRecord>> {
        let locking = format!("{SELECT_STUDENT} FOR UPDATE");
        fetch_student(id, &locking, &mut *self.txn).await
    }

    async fn mark_registered(&mut self, id: &StudentId, via: &str) -> GradRegResult<Timestamp> {
        //the `registered = FALSE` is belt and braces - we already hold the row lock
        let registered_at: Option<OffsetDateTime> = sqlx::query_scalar(
            "UPDATE public.students SET registered = TRUE, registered_at = now(), registered_via = $2 WHERE student_id = $1 AND registered = FALSE RETURNING registered_at",
        )
        .bind(id.as_str())
        .bind(via)
        .fetch_optional(&mut *self.txn)
        .await
        .map_err(query_error)?;

        match registered_at {
            Some(at) => to_timestamp(at),
            None => Err(GradRegError::TransactionConflict),
        }
    }

    async fn commit(self) -> GradRegResult<()> {
        self.txn.commit().await.map_err(|e| {
            GradRegError::from_store(e, |source| GradRegError::CommitTransaction { source })
        })
    }

    async fn rollback(self) -> GradRegResult<()> {
        self.txn.rollback().await.map_err(|e| {
            GradRegError::from_store(e, |source| GradRegError::RollbackTransaction { source })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{RegistrationOutcome, register};
    use sqlx::PgPool;

    fn row(registered: bool, at: Option<OffsetDateTime>, via: Option<&str>) -> StudentRow {
        StudentRow {
            student_id: "24WMR09274".into(),
            name: "Grace Hopper".into(),
            course: "BSc Computing".into(),
            award: "Distinction".into(),
            image_path: Some(String::new()),
            seat_num: 4,
            registered,
            registered_at: at,
            registered_via: via.map(str::to_string),
        }
    }

    #[test]
    fn unregistered_rows_convert() {
        let record = StudentRecord::try_from(row(false, None, None)).unwrap();
        assert_eq!(record.id.as_str(), "24WMR09274");
        assert_eq!(record.seat_num, 4);
        assert_eq!(record.image_path, None);
        assert!(!record.is_registered());
    }

    #[test]
    fn registered_rows_convert() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let record = StudentRecord::try_from(row(true, Some(at), Some("web"))).unwrap();
        let registration = record.registration.unwrap();
        assert_eq!(registration.at, Timestamp::from_second(1_700_000_000).unwrap());
        assert_eq!(registration.via, "web");
    }

    #[test]
    fn half_registered_rows_are_rejected() {
        assert!(matches!(
            StudentRecord::try_from(row(true, None, Some("web"))),
            Err(GradRegError::InconsistentRecord { .. })
        ));
    }

    async fn seeded(pool: &PgPool) -> PostgresRecordStore {
        sqlx::query(
            "INSERT INTO public.students (student_id, name, course, award, seat_num) VALUES ('S1', 'Grace Hopper', 'BSc Computing', 'Distinction', 12)",
        )
        .execute(pool)
        .await
        .unwrap();
        PostgresRecordStore::from_pool(pool.clone(), 5)
    }

    async fn stored(store: &PostgresRecordStore) -> StudentRecord {
        let id = StudentId::parse("S1").unwrap();
        store.get_student(&id).await.unwrap().unwrap()
    }

    fn rejection_message(result: Result<sqlx::postgres::PgQueryResult, sqlx::Error>) -> String {
        result
            .unwrap_err()
            .as_database_error()
            .unwrap()
            .message()
            .to_string()
    }

    #[sqlx::test]
    #[ignore = "needs a postgres server in DATABASE_URL"]
    async fn racing_registrations_commit_once(pool: PgPool) {
        let store = seeded(&pool).await;

        let (a, b) = tokio::join!(
            register(&store, "S1", 12, "web"),
            register(&store, "S1", 12, "kiosk")
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        let registrations: Vec<_> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                RegistrationOutcome::Registered(registration) => Some(registration),
                _ => None,
            })
            .collect();
        assert_eq!(registrations.len(), 1);
        assert!(outcomes.contains(&RegistrationOutcome::AlreadyRegistered));
        assert_eq!(stored(&store).await.registration.as_ref(), Some(registrations[0]));
    }

    #[sqlx::test]
    #[ignore = "needs a postgres server in DATABASE_URL"]
    async fn wrong_seat_leaves_the_row_alone(pool: PgPool) {
        let store = seeded(&pool).await;
        let before = stored(&store).await;

        assert_eq!(
            register(&store, "S1", 99, "web").await.unwrap(),
            RegistrationOutcome::SeatMismatch
        );
        assert_eq!(stored(&store).await, before);
        assert!(!before.is_registered());
    }

    #[sqlx::test]
    #[ignore = "needs a postgres server in DATABASE_URL"]
    async fn registrations_cannot_be_undone_or_reseated(pool: PgPool) {
        let store = seeded(&pool).await;
        register(&store, "S1", 12, "web").await.unwrap();
        let registered = stored(&store).await;

        let undo = sqlx::query(
            "UPDATE public.students SET registered = FALSE, registered_at = NULL, registered_via = NULL WHERE student_id = 'S1'",
        )
        .execute(&pool)
        .await;
        assert!(rejection_message(undo).contains("already registered"));

        let reseat =
            sqlx::query("UPDATE public.students SET seat_num = 13 WHERE student_id = 'S1'")
                .execute(&pool)
                .await;
        assert!(rejection_message(reseat).contains("immutable"));

        assert_eq!(stored(&store).await, registered);
    }

    #[sqlx::test]
    #[ignore = "needs a postgres server in DATABASE_URL"]
    async fn half_registered_rows_cannot_be_written(pool: PgPool) {
        let err = sqlx::query(
            "INSERT INTO public.students (student_id, name, course, award, seat_num, registered, registered_via) VALUES ('S2', 'Alan Turing', 'BSc Maths', 'Merit', 3, TRUE, 'web')",
        )
        .execute(&pool)
        .await
        .unwrap_err();

        assert_eq!(
            err.as_database_error().unwrap().constraint(),
            Some("registration_is_all_or_nothing")
        );
    }
}
