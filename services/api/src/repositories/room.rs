//! PostgreSQL room directory

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RoomDirectory, StorageResult};
use crate::models::Room;

/// Room directory backed by the `rooms` table
#[derive(Clone)]
pub struct PgRoomDirectory {
    pool: PgPool,
}

impl PgRoomDirectory {
    /// Create a new room directory
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomDirectory for PgRoomDirectory {
    async fn find(&self, id: i32) -> StorageResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, capacity, resources, location, active
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn list_active(&self) -> StorageResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, capacity, resources, location, active
            FROM rooms
            WHERE active
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }
}
