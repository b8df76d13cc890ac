//! SurrealDB implementation of [`ReadingRepository`].
//!
//! Readings are append-only. The monotonic `seq` comes from a
//! single-row atomic counter increment scoped into the same query that
//! creates the reading, so ordering survives identical timestamps.

use chrono::{DateTime, Utc};
use climon_core::error::ClimonResult;
use climon_core::models::reading::{NewReading, Reading};
use climon_core::repository::{ReadingRepository, TimeRange};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ReadingRow {
    seq: u64,
    place_id: String,
    place: String,
    temperature: f64,
    humidity: f64,
    warning: Option<String>,
    recorded_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ReadingRowWithId {
    record_id: String,
    seq: u64,
    place_id: String,
    place: String,
    temperature: f64,
    humidity: f64,
    warning: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl ReadingRow {
    fn into_reading(self, id: Uuid) -> Reading {
        Reading {
            id,
            seq: self.seq,
            place_id: self.place_id,
            place: self.place,
            temperature: self.temperature,
            humidity: self.humidity,
            warning: self.warning,
            recorded_at: self.recorded_at,
        }
    }
}

impl ReadingRowWithId {
    fn try_into_reading(self) -> Result<Reading, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Reading {
            id,
            seq: self.seq,
            place_id: self.place_id,
            place: self.place,
            temperature: self.temperature,
            humidity: self.humidity,
            warning: self.warning,
            recorded_at: self.recorded_at,
        })
    }
}

/// SurrealDB implementation of the Reading repository.
pub struct SurrealReadingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealReadingRepository<C> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<C: Connection> SurrealReadingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReadingRepository for SurrealReadingRepository<C> {
    async fn insert(&self, input: NewReading) -> ClimonResult<Reading> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // Statement 0 bumps the counter, statement 1 creates the row.
        // Each statement is atomic; the counter is a single row, so two
        // concurrent inserts can never observe the same seq.
        let result = self
            .db
            .query(
                "LET $c = (UPSERT counter:reading SET n += 1 RETURN AFTER); \
                 CREATE type::record('reading', $id) SET \
                 seq = $c[0].n, \
                 place_id = $place_id, \
                 place = $place, \
                 temperature = $temperature, \
                 humidity = $humidity, \
                 warning = $warning, \
                 recorded_at = $recorded_at ?? time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("place_id", input.place_id))
            .bind(("place", input.place))
            .bind(("temperature", input.temperature))
            .bind(("humidity", input.humidity))
            .bind(("warning", input.warning))
            .bind(("recorded_at", input.recorded_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<ReadingRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "reading".into(),
            id: id_str,
        })?;

        Ok(row.into_reading(id))
    }

    async fn latest(&self, place_id: &str) -> ClimonResult<Option<Reading>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM reading \
                 WHERE place_id = $place_id \
                 ORDER BY recorded_at DESC, seq DESC \
                 LIMIT 1",
            )
            .bind(("place_id", place_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReadingRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_reading()?)),
            None => Ok(None),
        }
    }

    async fn latest_per_place(&self, place_ids: &[String]) -> ClimonResult<Vec<Reading>> {
        let mut readings = Vec::with_capacity(place_ids.len());
        for place_id in place_ids {
            if let Some(reading) = self.latest(place_id).await? {
                readings.push(reading);
            }
        }
        Ok(readings)
    }

    async fn history(&self, place_id: &str, range: TimeRange) -> ClimonResult<Vec<Reading>> {
        let mut conditions = vec!["place_id = $place_id"];
        if range.from.is_some() {
            conditions.push("recorded_at >= $from");
        }
        if range.to.is_some() {
            conditions.push("recorded_at <= $to");
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM reading \
             WHERE {} \
             ORDER BY recorded_at DESC, seq DESC",
            conditions.join(" AND ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("place_id", place_id.to_string()));

        if let Some(from) = range.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = range.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<ReadingRowWithId> = result.take(0).map_err(DbError::from)?;

        let readings = rows
            .into_iter()
            .map(|row| row.try_into_reading())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(readings)
    }
}
