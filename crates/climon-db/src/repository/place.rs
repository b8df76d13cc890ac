//! SurrealDB implementation of [`PlaceRepository`].
//!
//! The known-place set is derived bookkeeping: registration and every
//! reading insert record the compound identifier here so the owner's
//! place list covers everything ever observed.

use climon_core::error::ClimonResult;
use climon_core::repository::PlaceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PlaceRow {
    place_id: String,
}

/// SurrealDB implementation of the known-place repository.
pub struct SurrealPlaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealPlaceRepository<C> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<C: Connection> SurrealPlaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlaceRepository for SurrealPlaceRepository<C> {
    async fn record(&self, place_id: &str) -> ClimonResult<()> {
        // Record id is derived from the place_id, so re-recording the
        // same place upserts the same row.
        self.db
            .query(
                "UPSERT type::record('known_place', $place_id) SET \
                 place_id = $place_id",
            )
            .bind(("place_id", place_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> ClimonResult<Vec<String>> {
        let mut result = self
            .db
            .query("SELECT place_id FROM known_place ORDER BY place_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlaceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|row| row.place_id).collect())
    }
}
