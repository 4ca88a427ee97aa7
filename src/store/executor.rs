//! Query executor
//!
//! Runs a `SeriesQuery` against the shared backend and drains its cursor.
//! A failed call or a failed pull aborts the whole read. A row the caller's
//! decoder rejects (missing column, unexpected type) is dropped on its own
//! and counted.
//!
//! ```text
//! SeriesQuery → backend.query → RowStream → decode each row → Vec<T>
//! ```

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;

use super::error::{StoreError, StoreResult};
use crate::backend::{QueryContext, Row, RowStream, SeriesQuery, TimeSeriesBackend};

/// Executes queries for the view builders
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn TimeSeriesBackend>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn TimeSeriesBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn TimeSeriesBackend> {
        &self.backend
    }

    /// Start a query and return its lazy cursor
    pub async fn rows(&self, query: &SeriesQuery, ctx: &QueryContext) -> StoreResult<RowStream> {
        self.backend
            .query(query, ctx)
            .await
            .map_err(|e| StoreError::from_backend(&query.measurement, e))
    }

    /// Feed every row to `visit`, in backend order
    ///
    /// `visit` returns false for a row it could not use. Returns the number
    /// of rows accepted.
    pub async fn for_each_row<F>(
        &self,
        query: &SeriesQuery,
        ctx: &QueryContext,
        mut visit: F,
    ) -> StoreResult<usize>
    where
        F: FnMut(Row) -> bool,
    {
        let started = Instant::now();
        let mut rows = self.rows(query, ctx).await?;
        let mut accepted = 0usize;
        let mut skipped = 0usize;

        while let Some(row) = rows.next().await {
            let row = row.map_err(|e| StoreError::from_backend(&query.measurement, e))?;
            if visit(row) {
                accepted += 1;
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(
                measurement = %query.measurement,
                skipped,
                "Skipped rows with missing or mistyped columns"
            );
        }
        tracing::debug!(
            measurement = %query.measurement,
            window = %query.window,
            rows = accepted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query complete"
        );

        Ok(accepted)
    }

    /// Decode every row with `decode`, dropping rows it returns `None` for
    pub async fn collect<T, F>(
        &self,
        query: &SeriesQuery,
        ctx: &QueryContext,
        mut decode: F,
    ) -> StoreResult<Vec<T>>
    where
        F: FnMut(&Row) -> Option<T>,
    {
        let mut out = Vec::new();
        self.for_each_row(query, ctx, |row| match decode(&row) {
            Some(item) => {
                out.push(item);
                true
            }
            None => false,
        })
        .await?;
        Ok(out)
    }
}
