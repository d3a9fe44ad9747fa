//! PostgreSQL reservation repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::{ReservationStore, RowVersion, StorageError, StorageResult};
use crate::models::{Reservation, ReservationFilter, TimeSlot};

#[derive(FromRow)]
struct ReservationRow {
    id: Uuid,
    room_id: i32,
    title: String,
    description: Option<String>,
    participants: i32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    owner_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StorageError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            room_id: row.room_id,
            title: row.title,
            description: row.description,
            participants: row.participants,
            start_time: row.start_time,
            end_time: row.end_time,
            owner_id: row.owner_id,
            status: row.status.parse().map_err(StorageError::Backend)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Reservation repository backed by PostgreSQL
///
/// Writes run in a `SERIALIZABLE` transaction that checks for overlaps
/// before writing. The `reservations_no_overlap` exclusion constraint backs
/// the check; its violations surface as [`StorageError::Conflict`]. Updates
/// only apply while the row still carries the [`RowVersion`] they were
/// computed from.
#[derive(Clone)]
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    /// Create a new reservation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin_serializable(&self) -> StorageResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn find_overlap(
        conn: &mut PgConnection,
        room_id: i32,
        slot: &TimeSlot,
        exclude: Option<Uuid>,
    ) -> StorageResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, room_id, title, description, participants, start_time, end_time,
                   owner_id, status, created_at, updated_at
            FROM reservations
            WHERE room_id = $1
              AND status <> 'cancelled'
              AND start_time < $3
              AND end_time > $2
              AND ($4::uuid IS NULL OR id <> $4)
            ORDER BY start_time
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .bind(slot.start)
        .bind(slot.end)
        .bind(exclude)
        .fetch_optional(conn)
        .await?;

        row.map(Reservation::try_from).transpose()
    }

    async fn insert_checked(&self, reservation: &Reservation) -> StorageResult<Reservation> {
        let mut tx = self.begin_serializable().await?;

        if reservation.is_active() {
            let existing =
                Self::find_overlap(&mut *tx, reservation.room_id, &reservation.slot(), None).await?;
            if let Some(existing) = existing {
                return Err(StorageError::Conflict(Some(Box::new(existing))));
            }
        }

        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            INSERT INTO reservations
                (id, room_id, title, description, participants, start_time, end_time,
                 owner_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, room_id, title, description, participants, start_time, end_time,
                      owner_id, status, created_at, updated_at
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.room_id)
        .bind(&reservation.title)
        .bind(&reservation.description)
        .bind(reservation.participants)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(reservation.owner_id)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Reservation::try_from(row)
    }

    async fn update_guarded(
        &self,
        reservation: &Reservation,
        expected: RowVersion,
        recheck: bool,
    ) -> StorageResult<Option<Reservation>> {
        let mut tx = self.begin_serializable().await?;

        if recheck && reservation.is_active() {
            let existing = Self::find_overlap(
                &mut *tx,
                reservation.room_id,
                &reservation.slot(),
                Some(reservation.id),
            )
            .await?;
            if let Some(existing) = existing {
                return Err(StorageError::Conflict(Some(Box::new(existing))));
            }
        }

        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            UPDATE reservations
            SET room_id = $2, title = $3, description = $4, participants = $5,
                start_time = $6, end_time = $7, status = $8, updated_at = $9
            WHERE id = $1 AND updated_at = $10 AND status = $11
            RETURNING id, room_id, title, description, participants, start_time, end_time,
                      owner_id, status, created_at, updated_at
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.room_id)
        .bind(&reservation.title)
        .bind(&reservation.description)
        .bind(reservation.participants)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(reservation.status.as_str())
        .bind(reservation.updated_at)
        .bind(expected.updated_at)
        .bind(expected.status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        row.map(Reservation::try_from).transpose()
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StorageResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, room_id, title, description, participants, start_time, end_time,
                   owner_id, status, created_at, updated_at
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Reservation::try_from).transpose()
    }

    async fn list(&self, filter: &ReservationFilter) -> StorageResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, room_id, title, description, participants, start_time, end_time,
                   owner_id, status, created_at, updated_at
            FROM reservations
            WHERE ($1::int IS NULL OR room_id = $1)
              AND ($2::timestamptz IS NULL OR start_time >= $2)
              AND ($3::timestamptz IS NULL OR end_time <= $3)
              AND ($4::uuid IS NULL OR owner_id = $4)
              AND ($5 OR status <> 'cancelled')
            ORDER BY start_time ASC, created_at ASC
            "#,
        )
        .bind(filter.room_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.owner_id)
        .bind(filter.include_cancelled)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn insert(&self, reservation: &Reservation) -> StorageResult<Reservation> {
        self.insert_checked(reservation)
            .await
            .map_err(StorageError::after_overlap_check)
    }

    async fn update(
        &self,
        reservation: &Reservation,
        expected: RowVersion,
        recheck: bool,
    ) -> StorageResult<Option<Reservation>> {
        let result = self.update_guarded(reservation, expected, recheck).await;
        if recheck {
            result.map_err(StorageError::after_overlap_check)
        } else {
            result
        }
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn busy_rooms(&self, slot: &TimeSlot) -> StorageResult<Vec<i32>> {
        let rooms = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT DISTINCT room_id
            FROM reservations
            WHERE status <> 'cancelled'
              AND start_time < $2
              AND end_time > $1
            "#,
        )
        .bind(slot.start)
        .bind(slot.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }
}

/// These tests need a reachable PostgreSQL server configured through the
/// `DATABASE_*` variables. Without `DATABASE_URL` they return early.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ANONYMOUS_OWNER, ReservationStatus};
    use chrono::TimeZone;
    use common::database::{DatabaseConfig, init_pool, run_migrations};

    async fn connect() -> Option<PgReservationStore> {
        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL store test");
            return None;
        }
        let config = DatabaseConfig::from_env().unwrap();
        let pool = init_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Some(PgReservationStore::new(pool))
    }

    /// A room id no other test run uses; rooms are not foreign keys
    fn scratch_room() -> i32 {
        1_000_000 + (Uuid::new_v4().as_u128() % 1_000_000) as i32
    }

    async fn clear(store: &PgReservationStore, room_id: i32) {
        sqlx::query("DELETE FROM reservations WHERE room_id = $1")
            .bind(room_id)
            .execute(&store.pool)
            .await
            .unwrap();
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, hour, minute, 0).unwrap()
    }

    fn reservation(room_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            room_id,
            title: "Sync".to_string(),
            description: None,
            participants: 1,
            start_time: start,
            end_time: end,
            owner_id: ANONYMOUS_OWNER,
            status: ReservationStatus::Confirmed,
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    #[tokio::test]
    async fn test_booking_scenarios_against_postgres() {
        let Some(store) = connect().await else {
            return;
        };
        let room = scratch_room();

        // A
        let a = store
            .insert(&reservation(room, at(14, 0), at(15, 0)))
            .await
            .unwrap();

        // B
        match store.insert(&reservation(room, at(14, 30), at(15, 30))).await {
            Err(StorageError::Conflict(Some(existing))) => assert_eq!(existing.id, a.id),
            other => panic!("expected conflict naming A, got {other:?}"),
        }

        // C
        store
            .insert(&reservation(room, at(15, 0), at(16, 0)))
            .await
            .unwrap();

        // D
        let mut cancelled = a.clone();
        cancelled.status = ReservationStatus::Cancelled;
        cancelled.updated_at = at(9, 0);
        let cancelled = store
            .update(&cancelled, RowVersion::of(&a), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        store
            .insert(&reservation(room, at(14, 0), at(15, 0)))
            .await
            .unwrap();

        // A write computed from the confirmed version no longer applies
        let mut renamed = a.clone();
        renamed.title = "Renamed".to_string();
        renamed.updated_at = at(10, 0);
        assert!(
            store
                .update(&renamed, RowVersion::of(&a), false)
                .await
                .unwrap()
                .is_none()
        );
        let stored = store.find(a.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Cancelled);

        clear(&store, room).await;
    }

    #[tokio::test]
    async fn test_update_recheck_excludes_itself() {
        let Some(store) = connect().await else {
            return;
        };
        let room = scratch_room();

        let booked = store
            .insert(&reservation(room, at(10, 0), at(12, 0)))
            .await
            .unwrap();
        let neighbour = store
            .insert(&reservation(room, at(13, 0), at(14, 0)))
            .await
            .unwrap();

        let mut extended = booked.clone();
        extended.end_time = at(13, 0);
        extended.updated_at = at(9, 0);
        let extended = store
            .update(&extended, RowVersion::of(&booked), true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(extended.end_time, at(13, 0));

        let mut overlapping = extended.clone();
        overlapping.end_time = at(13, 30);
        overlapping.updated_at = at(9, 30);
        match store
            .update(&overlapping, RowVersion::of(&extended), true)
            .await
        {
            Err(StorageError::Conflict(Some(existing))) => assert_eq!(existing.id, neighbour.id),
            other => panic!("expected conflict naming the neighbour, got {other:?}"),
        }

        clear(&store, room).await;
    }

    #[tokio::test]
    async fn test_concurrent_inserts_admit_one() {
        let Some(store) = connect().await else {
            return;
        };
        let room = scratch_room();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(&reservation(room, at(10, 0), at(11, 0))).await
            }));
        }

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(StorageError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(confirmed, 1);

        clear(&store, room).await;
    }

    #[tokio::test]
    async fn test_exclusion_constraint_maps_to_conflict() {
        let Some(store) = connect().await else {
            return;
        };
        let room = scratch_room();
        store
            .insert(&reservation(room, at(10, 0), at(11, 0)))
            .await
            .unwrap();

        let err = sqlx::query(
            r#"
            INSERT INTO reservations
                (id, room_id, title, participants, start_time, end_time, owner_id, status)
            VALUES ($1, $2, 'Raw', 1, $3, $4, $5, 'confirmed')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(room)
        .bind(at(10, 30))
        .bind(at(11, 30))
        .bind(ANONYMOUS_OWNER)
        .execute(&store.pool)
        .await
        .unwrap_err();
        assert!(matches!(
            StorageError::from(err),
            StorageError::Conflict(None)
        ));

        clear(&store, room).await;
    }
}
