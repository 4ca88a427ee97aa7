//! Time-series backend
//!
//! Everything the store needs from the database behind it: write a batch of
//! points in line protocol, run a `SeriesQuery` and stream its rows back,
//! check health and release resources.
//!
//! - **influx**: InfluxDB 3 over HTTP
//! - **memory**: in-process implementation for tests and local runs
//!
//! Every call takes a `QueryContext` carrying the caller's cancellation token
//! and deadline.

mod context;
mod error;
pub mod influx;
pub mod line_protocol;
pub mod memory;
mod point;
mod query;
mod row;

pub use context::QueryContext;
pub use error::{BackendError, BackendResult};
pub use influx::{InfluxBackend, InfluxConfig};
pub use line_protocol::{decode_batch, encode_batch, LineProtocolError};
pub use memory::MemoryBackend;
pub use point::{FieldValue, Metric};
pub use query::{Aggregation, SelectItem, SeriesQuery, SeriesQueryBuilder, TIME_COLUMN};
pub use row::{parse_timestamp, Row, Scalar};

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Forward-only cursor over query results
///
/// Rows are pulled one at a time; an `Err` item ends the useful part of
/// the stream.
pub type RowStream = BoxStream<'static, BackendResult<Row>>;

/// A time-series database the store can read from and write to
#[async_trait]
pub trait TimeSeriesBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Write a line-protocol body
    ///
    /// Points without a timestamp are stamped by the backend at write time.
    async fn write(&self, body: String, ctx: &QueryContext) -> BackendResult<()>;

    /// Run a query and return a cursor over its rows
    async fn query(&self, query: &SeriesQuery, ctx: &QueryContext) -> BackendResult<RowStream>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> BackendResult<()>;

    /// Release connections; further calls may fail
    async fn close(&self) {}
}
