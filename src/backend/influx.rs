//! InfluxDB 3 HTTP backend
//!
//! - writes: `POST /api/v2/write` with a line-protocol body, nanosecond precision
//! - queries: `POST /api/v3/query_sql` with `format=jsonl`; the response is
//!   read chunk by chunk and split into rows as lines complete, so a large
//!   result never has to be buffered whole
//! - health: `GET /health`

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::{BackendError, BackendResult, QueryContext, Row, RowStream, SeriesQuery, TimeSeriesBackend};

/// Connection settings for InfluxDB
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. "http://localhost:8181"
    pub host: String,
    /// API token; sent as `Authorization: Token ...` when set
    pub token: Option<String>,
    pub org: String,
    /// Database (bucket) holding the health measurements
    pub database: String,
    /// Transport-level timeout for a single request
    pub request_timeout_ms: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8181".to_string(),
            token: None,
            org: "vitalstream".to_string(),
            database: "health".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Serialize)]
struct SqlRequest<'a> {
    db: &'a str,
    q: &'a str,
    format: &'a str,
}

/// InfluxDB 3 client
pub struct InfluxBackend {
    client: Client,
    config: InfluxConfig,
}

impl InfluxBackend {
    pub fn new(config: InfluxConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }
}

/// Turn a non-success response into an error
///
/// Server-side failures read as the backend being unavailable; client-side
/// rejections become `reject` (a query or write error).
async fn check_status(
    response: Response,
    reject: fn(String) -> BackendError,
) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = format!("{}: {}", status, text.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(BackendError::Unavailable(message))
    } else {
        Err(reject(message))
    }
}

#[async_trait]
impl TimeSeriesBackend for InfluxBackend {
    fn name(&self) -> &str {
        "influxdb"
    }

    async fn write(&self, body: String, ctx: &QueryContext) -> BackendResult<()> {
        ctx.check()?;

        let request = self
            .authorize(self.client.post(self.url("/api/v2/write")))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.database.as_str()),
                ("precision", "ns"),
            ])
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);

        ctx.run(async {
            let response = request.send().await?;
            check_status(response, BackendError::Write).await?;
            Ok::<_, BackendError>(())
        })
        .await
    }

    async fn query(&self, query: &SeriesQuery, ctx: &QueryContext) -> BackendResult<RowStream> {
        ctx.check()?;

        let sql = query.to_sql();
        tracing::trace!(sql = %sql, "Sending SQL query");

        let request = self
            .authorize(self.client.post(self.url("/api/v3/query_sql")))
            .json(&SqlRequest {
                db: &self.config.database,
                q: &sql,
                format: "jsonl",
            });

        let response = ctx
            .run(async {
                let response = request.send().await?;
                check_status(response, BackendError::Query).await
            })
            .await?;

        Ok(ctx.guard(jsonl_rows(response.bytes_stream())))
    }

    async fn health_check(&self) -> BackendResult<()> {
        let response = self
            .authorize(self.client.get(self.url("/health")))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn close(&self) {
        tracing::debug!(host = %self.config.host, "Closing InfluxDB client");
    }
}

struct JsonLines {
    chunks: stream::BoxStream<'static, BackendResult<Vec<u8>>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl JsonLines {
    async fn next_row(&mut self) -> Option<BackendResult<Row>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                match parse_line(&line) {
                    Some(row) => return Some(row),
                    None => continue,
                }
            }

            if self.finished {
                if self.buffer.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.buffer);
                return parse_line(&line);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.finished = true;
                    self.buffer.clear();
                    return Some(Err(e));
                }
                None => self.finished = true,
            }
        }
    }
}

fn parse_line(line: &[u8]) -> Option<BackendResult<Row>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice::<Map<String, Value>>(line)
            .map(Row::from_json)
            .map_err(BackendError::from),
    )
}

/// Split a chunked JSON-lines body into rows
///
/// Lines may straddle chunk boundaries. A transport error is yielded once
/// and ends the stream; a malformed line is yielded as an error and reading
/// continues with the next line.
pub fn jsonl_rows<S, B, E>(chunks: S) -> RowStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BackendError> + Send + 'static,
{
    let state = JsonLines {
        chunks: chunks
            .map(|chunk| chunk.map(|b| b.as_ref().to_vec()).map_err(Into::into))
            .boxed(),
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        let row = state.next_row().await?;
        Some((row, state))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeWindow;
    use chrono::{TimeZone, Utc};
    use futures_util::TryStreamExt;

    fn chunks(parts: &[&str]) -> Vec<Result<Vec<u8>, BackendError>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    #[tokio::test]
    async fn test_rows_span_chunk_boundaries() {
        let body = chunks(&["{\"qty\": 1", "0.5}\n{\"q", "ty\": 2}\n\n{\"qty\": 3}"]);
        let rows: Vec<Row> = jsonl_rows(stream::iter(body)).try_collect().await.unwrap();

        let values: Vec<f64> = rows.iter().filter_map(|r| r.f64("qty")).collect();
        assert_eq!(values, vec![10.5, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_decode_error() {
        let body = chunks(&["{\"qty\": 1}\nnot json\n{\"qty\": 2}\n"]);
        let items: Vec<BackendResult<Row>> = jsonl_rows(stream::iter(body)).collect().await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(BackendError::Decode(_))));
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let body: Vec<Result<Vec<u8>, BackendError>> = vec![
            Ok(b"{\"qty\": 1}\n{\"qty\"".to_vec()),
            Err(BackendError::Unavailable("connection reset".to_string())),
            Ok(b": 2}\n".to_vec()),
        ];
        let items: Vec<BackendResult<Row>> = jsonl_rows(stream::iter(body)).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(BackendError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_body_has_no_rows() {
        let rows: Vec<Row> = jsonl_rows(stream::iter(chunks(&[])))
            .try_collect()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = InfluxBackend::new(InfluxConfig {
            host: "http://influx:8181/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.url("/health"), "http://influx:8181/health");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let backend = InfluxBackend::new(InfluxConfig {
            host: "http://127.0.0.1:1".to_string(),
            request_timeout_ms: 2_000,
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            backend.health_check().await,
            Err(BackendError::Unavailable(_))
        ));

        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 4, 0, 0).unwrap(),
        );
        let query = SeriesQuery::from("heart_rate", window).column("avg").build();
        assert!(matches!(
            backend.query(&query, &QueryContext::new()).await,
            Err(BackendError::Unavailable(_))
        ));
    }
}
