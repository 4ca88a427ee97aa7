//! Point ingestion
//!
//! The whole batch is validated and encoded before anything is sent, then
//! written in a single backend call. Whether the backend applies a rejected
//! batch partially is up to the backend.

use super::error::{StoreError, StoreResult};
use super::HealthStore;
use crate::backend::{encode_batch, Metric, QueryContext};

impl HealthStore {
    /// Write a batch of points; returns how many were written
    ///
    /// An empty batch succeeds without contacting the backend.
    pub async fn ingest(&self, metrics: &[Metric], ctx: &QueryContext) -> StoreResult<usize> {
        if metrics.is_empty() {
            return Ok(0);
        }

        let body = encode_batch(metrics).map_err(|e| StoreError::Ingest(e.to_string()))?;
        let bytes = body.len();

        self.backend()
            .write(body, ctx)
            .await
            .map_err(StoreError::from_write)?;

        tracing::info!(points = metrics.len(), bytes, "Ingested batch");
        Ok(metrics.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FieldValue, SeriesQuery, TimeSeriesBackend};
    use crate::store::fixtures::*;
    use crate::time::TimeWindow;
    use chrono::Duration;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_field_types_survive_write() {
        let (store, backend) = store_at(noon_may_first());
        let at = local(2024, 5, 1, 9, 0);
        let point = Metric::new("probe")
            .tag("source", "test")
            .field("f", 3.14)
            .field("i", 7i64)
            .field("w", 7.0)
            .field("b", true)
            .field("s", "x")
            .at(at);

        let written = store.ingest(&[point], &QueryContext::new()).await.unwrap();
        assert_eq!(written, 1);

        let window = TimeWindow::new(at, at + Duration::seconds(1));
        let query = SeriesQuery::from("probe", window).build();
        let rows: Vec<_> = backend
            .query(&query, &QueryContext::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("f"), Some(&crate::backend::Scalar::Float(3.14)));
        assert_eq!(row.get("i"), Some(&crate::backend::Scalar::Integer(7)));
        assert_eq!(row.get("w"), Some(&crate::backend::Scalar::Float(7.0)));
        assert_eq!(row.get("b"), Some(&crate::backend::Scalar::Boolean(true)));
        assert_eq!(row.str("s"), Some("x"));
        assert_eq!(row.str("source"), Some("test"));
    }

    #[tokio::test]
    async fn test_untimed_point_is_stamped_at_write() {
        let now = noon_may_first();
        let (store, backend) = store_at(now);
        let point = Metric::new("heart_rate").field("avg", 64.0);

        store.ingest(&[point], &QueryContext::new()).await.unwrap();

        let window = TimeWindow::new(now, now + Duration::seconds(1));
        let query = SeriesQuery::from("heart_rate", window).column("time").build();
        let rows: Vec<_> = backend
            .query(&query, &QueryContext::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows[0].time("time"), Some(now));
    }

    #[tokio::test]
    async fn test_invalid_point_rejects_whole_batch() {
        let (store, backend) = store_at(noon_may_first());
        let batch = vec![
            Metric::new("heart_rate").field("avg", 64.0),
            Metric::new("heart_rate"),
        ];

        let result = store.ingest(&batch, &QueryContext::new()).await;

        match result {
            Err(StoreError::Ingest(message)) => assert!(message.starts_with("metric #1")),
            other => panic!("expected ingest error, got {:?}", other),
        }
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_nan_is_rejected() {
        let (store, _) = store_at(noon_may_first());
        let point = Metric {
            fields: [("avg".to_string(), FieldValue::Float(f64::NAN))].into(),
            ..Metric::new("heart_rate")
        };
        assert!(matches!(
            store.ingest(&[point], &QueryContext::new()).await,
            Err(StoreError::Ingest(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_backend() {
        let (store, backend) = store_at(noon_may_first());
        backend.set_available(false);
        assert_eq!(store.ingest(&[], &QueryContext::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let (store, backend) = store_at(noon_may_first());
        backend.set_available(false);
        let result = store
            .ingest(&[Metric::new("m").field("v", 1i64)], &QueryContext::new())
            .await;
        assert!(matches!(result, Err(StoreError::BackendUnavailable(_))));
    }
}
