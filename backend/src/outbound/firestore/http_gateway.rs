//! Reqwest-backed Firestore report gateway.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::values::{decode_fields, encode_fields};
use crate::domain::ports::{ReportGateway, ReportGatewayError, ReportSnapshot, SnapshotStream};
use crate::domain::{Report, ReportPatch, ReportRecord, StoreId};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
const COLLECTION: &str = "reports";
const PATCH_FIELDS: [&str; 4] = ["status", "updatedAt", "statusHistory", "workerId"];

/// Connection settings for one Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub database: String,
    pub base_url: Url,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl FirestoreConfig {
    /// Settings for the default database of `project_id`.
    pub fn new(project_id: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            project_id: project_id.into(),
            api_key: None,
            database: "(default)".to_owned(),
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DocumentDto {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct QueryRowDto {
    #[serde(default)]
    document: Option<DocumentDto>,
}

pub struct FirestoreReportGateway {
    client: Client,
    config: FirestoreConfig,
    documents: Url,
}

impl FirestoreReportGateway {
    /// Build a gateway with a reqwest client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or the document
    /// root URL is invalid.
    pub fn new(config: FirestoreConfig) -> Result<Self, ReportGatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ReportGatewayError::connection(err.to_string()))?;
        let documents = config
            .base_url
            .join(&format!(
                "projects/{}/databases/{}/documents/",
                config.project_id, config.database
            ))
            .map_err(|err| ReportGatewayError::query(format!("invalid document root: {err}")))?;
        Ok(Self {
            client,
            config,
            documents,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ReportGatewayError> {
        let mut url = self
            .documents
            .join(path)
            .map_err(|err| ReportGatewayError::query(format!("invalid document path: {err}")))?;
        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ReportGatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    /// Independent handle for the polling stream; shares the client pool.
    fn clone_for_polling(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            documents: self.documents.clone(),
        }
    }

    async fn run_query(&self) -> Result<ReportSnapshot, ReportGatewayError> {
        // `:runQuery` hangs off the documents root itself, not a child path.
        let root = self.documents.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{root}:runQuery"))
            .map_err(|err| ReportGatewayError::query(format!("invalid query url: {err}")))?;
        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": COLLECTION }],
                "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
            }
        });
        let raw = self.send(self.client.post(url).json(&body)).await?;
        parse_query_rows(&raw)
    }
}

#[async_trait]
impl ReportGateway for FirestoreReportGateway {
    async fn subscribe(&self) -> Result<SnapshotStream, ReportGatewayError> {
        let first = self.run_query().await?;
        let poller = self.clone_for_polling();
        let interval = self.config.poll_interval;
        let initial = stream::once(std::future::ready(Ok(first.clone())));
        let updates = stream::unfold(
            (poller, Some(first), false),
            move |(poller, last, failed)| async move {
                if failed {
                    return None;
                }
                loop {
                    tokio::time::sleep(interval).await;
                    match poller.run_query().await {
                        Ok(snapshot) if last.as_ref() == Some(&snapshot) => continue,
                        Ok(snapshot) => {
                            return Some((Ok(snapshot.clone()), (poller, Some(snapshot), false)));
                        }
                        Err(err) => return Some((Err(err), (poller, last, true))),
                    }
                }
            },
        );
        Ok(initial.chain(updates).boxed())
    }

    async fn create(&self, report: &Report) -> Result<StoreId, ReportGatewayError> {
        let fields = to_fields(&ReportRecord::from(report.clone()))?;
        let url = self.url(COLLECTION)?;
        let raw = self
            .send(self.client.post(url).json(&json!({ "fields": fields })))
            .await?;
        let document: DocumentDto = serde_json::from_slice(&raw)
            .map_err(|err| ReportGatewayError::decode(format!("create response: {err}")))?;
        let store_id = document_id(&document.name)?;
        debug!(%store_id, report_id = %report.id(), "report document created");
        Ok(store_id)
    }

    async fn update(
        &self,
        store_id: &StoreId,
        patch: &ReportPatch,
    ) -> Result<(), ReportGatewayError> {
        let fields = to_fields(patch)?;
        let mut url = self.url(&format!("{COLLECTION}/{}", store_id.as_str()))?;
        {
            let mut query = url.query_pairs_mut();
            for field in PATCH_FIELDS {
                query.append_pair("updateMask.fieldPaths", field);
            }
            query.append_pair("currentDocument.exists", "true");
        }
        let outcome = self
            .send(self.client.patch(url).json(&json!({ "fields": fields })))
            .await;
        match outcome {
            Ok(_) => Ok(()),
            Err(ReportGatewayError::Missing { .. }) => {
                Err(ReportGatewayError::missing(store_id.as_str()))
            }
            Err(err) => Err(err),
        }
    }
}

fn to_fields(value: &impl serde::Serialize) -> Result<Value, ReportGatewayError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(object)) => Ok(encode_fields(&object)),
        Ok(other) => Err(ReportGatewayError::query(format!(
            "expected an object to store, found {other}"
        ))),
        Err(err) => Err(ReportGatewayError::query(err.to_string())),
    }
}

fn document_id(name: &str) -> Result<StoreId, ReportGatewayError> {
    let id = name.rsplit('/').next().unwrap_or_default();
    StoreId::new(id).map_err(|_| ReportGatewayError::decode(format!("bad document name {name}")))
}

fn parse_query_rows(raw: &[u8]) -> Result<ReportSnapshot, ReportGatewayError> {
    let rows: Vec<QueryRowDto> = serde_json::from_slice(raw)
        .map_err(|err| ReportGatewayError::decode(format!("query response: {err}")))?;
    let mut reports = Vec::with_capacity(rows.len());
    for document in rows.into_iter().filter_map(|row| row.document) {
        match decode_document(&document) {
            Ok(report) => reports.push(report),
            Err(err) => warn!(document = %document.name, error = %err, "skipping unreadable report"),
        }
    }
    Ok(reports)
}

fn decode_document(document: &DocumentDto) -> Result<Report, ReportGatewayError> {
    let mut object = decode_fields(&document.fields).map_err(ReportGatewayError::decode)?;
    let store_id = document_id(&document.name)?;
    object.insert("storeId".to_owned(), Value::String(store_id.into()));
    serde_json::from_value(Value::Object(object))
        .map_err(|err| ReportGatewayError::decode(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> ReportGatewayError {
    ReportGatewayError::connection(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReportGatewayError {
    let preview: String = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(160)
        .collect();
    let message = format!("status {}: {preview}", status.as_u16());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ReportGatewayError::permission_denied(message)
        }
        StatusCode::NOT_FOUND => ReportGatewayError::missing(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            ReportGatewayError::connection(message)
        }
        _ => ReportGatewayError::query(message),
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network parts of the Firestore adapter.

    use super::*;
    use crate::domain::{ReportStatus, UserId};
    use crate::test_support::persisted_report;
    use rstest::rstest;

    fn gateway() -> FirestoreReportGateway {
        let mut config = FirestoreConfig::new("civic-demo").expect("config");
        config.api_key = Some("k".to_owned());
        FirestoreReportGateway::new(config).expect("gateway")
    }

    #[rstest]
    fn document_urls_carry_project_and_key() {
        let url = gateway().url("reports/doc-1").expect("url");
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/civic-demo/databases/(default)/documents/reports/doc-1?key=k"
        );
    }

    #[rstest]
    #[case(StatusCode::FORBIDDEN, "PermissionDenied")]
    #[case(StatusCode::NOT_FOUND, "Missing")]
    #[case(StatusCode::SERVICE_UNAVAILABLE, "Connection")]
    #[case(StatusCode::BAD_REQUEST, "Query")]
    fn statuses_map_to_gateway_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"error\": \"nope\"}");
        let actual = match error {
            ReportGatewayError::PermissionDenied { .. } => "PermissionDenied",
            ReportGatewayError::Missing { .. } => "Missing",
            ReportGatewayError::Connection { .. } => "Connection",
            ReportGatewayError::Query { .. } => "Query",
            ReportGatewayError::Decode { .. } => "Decode",
        };
        assert_eq!(actual, expected);
    }

    #[rstest]
    fn query_rows_decode_into_reports_with_store_ids() {
        let report = persisted_report(
            &UserId::for_email("fs@example.org"),
            9,
            ReportStatus::InProgress,
        );
        let fields = to_fields(&ReportRecord::from(report.clone())).expect("encode");
        let rows = json!([
            { "readTime": "2025-06-01T09:00:00Z" },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/reports/doc-9",
                    "fields": fields,
                }
            },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/reports/broken",
                    "fields": { "title": { "stringValue": "half a report" } },
                }
            }
        ]);

        let snapshot =
            parse_query_rows(&serde_json::to_vec(&rows).expect("bytes")).expect("parses");

        assert_eq!(snapshot, vec![report]);
    }

    #[rstest]
    fn patch_fields_encode_cleared_worker_as_null() {
        let report = persisted_report(&UserId::for_email("fs@example.org"), 2, ReportStatus::New);
        let fields = to_fields(&report.lifecycle_patch()).expect("encode");
        assert_eq!(fields["workerId"], json!({ "nullValue": null }));
        assert_eq!(fields["status"], json!({ "stringValue": "NEW" }));
        assert!(fields["updatedAt"].get("timestampValue").is_some());
    }
}
