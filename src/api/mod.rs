//! HTTP client for the OPFA backend.
//!
//! Every endpoint answers with a JSON object; failures are reported in-band
//! as `{"error": "..."}` and/or `"success": false`, often with a 4xx/5xx
//! status. Bodies are therefore decoded regardless of the HTTP status.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    AiAnalysis, Document, KnowledgeBaseInit, KnowledgeBaseStatus, MemberMatching, NewRfp,
    RfpForm, RfpRecord, SearchRequest, SearchResponse, SiteStats, Tender, TenderFilter,
    TenderSource, TenderStats, UploadFile,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Name of the Flask session cookie when only its value is configured.
const SESSION_COOKIE_NAME: &str = "session";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{}", .message.as_deref().unwrap_or("server reported a failure"))]
    Server { message: Option<String> },

    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),

    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// The message a user sees for this failure: the server's own error text,
    /// `fallback` when the server failed without one, or `network` when no
    /// usable response came back at all.
    pub fn user_message(&self, fallback: &str, network: &str) -> String {
        match self {
            ApiError::Server { message: Some(m) } if !m.is_empty() => m.clone(),
            ApiError::Server { .. } => fallback.to_string(),
            _ => network.to_string(),
        }
    }

    /// Short reason used in "X failed: <reason>" style notifications.
    pub fn reason(&self, fallback: &str) -> String {
        match self {
            ApiError::Server { message: Some(m) } if !m.is_empty() => m.clone(),
            ApiError::Server { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Either a bare session value or a full `name=value` cookie pair.
    pub session_cookie: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_cookie: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, ApiError> {
        if let Some(message) = self.error {
            return Err(ApiError::Server {
                message: Some(message),
            });
        }
        if self.success == Some(false) {
            return Err(ApiError::Server { message: None });
        }
        Ok(self.body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RfpListBody {
    #[serde(default)]
    rfps: Vec<RfpRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct RfpBody {
    #[serde(default)]
    rfp: Option<RfpRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsBody {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    document: Option<Document>,
}

/// Scrapers report completion through the presence of `success`, whatever
/// its value; only an `error` or a body without `success` is a failure.
#[derive(Debug, Default, Deserialize)]
struct ScrapeBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ScrapeBody {
    fn into_result(self) -> Result<Option<String>, ApiError> {
        if let Some(message) = self.error {
            return Err(ApiError::Server {
                message: Some(message),
            });
        }
        match self.success {
            Some(_) => Ok(self.message),
            None => Err(ApiError::Server { message: None }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TendersBody {
    #[serde(default)]
    tenders: Vec<Tender>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DocumentDeleted {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub rfp_id: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AnalysisOutcome {
    #[serde(default)]
    pub analysis: AiAnalysis,
    #[serde(default)]
    pub member_matching: Option<MemberMatching>,
}

#[derive(Serialize)]
struct MarkProcessed {
    tender_id: i64,
    processed: bool,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cookie: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        let cookie = config
            .session_cookie
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .map(|c| {
                if c.contains('=') {
                    c
                } else {
                    format!("{SESSION_COOKIE_NAME}={c}")
                }
            });

        Ok(Self {
            client,
            base_url,
            cookie,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute link for a path on the backend, e.g. a member's `/user/...` page.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(cookie) = &self.cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        req
    }

    async fn read_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, bytes = bytes.len(), "response received");
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        Self::read_json::<Envelope<T>>(req).await?.into_result()
    }

    pub async fn stats(&self) -> Result<SiteStats, ApiError> {
        debug!("GET /api/stats");
        self.send(self.request(Method::GET, "/api/stats")).await
    }

    pub async fn search(&self, body: &SearchRequest) -> Result<SearchResponse, ApiError> {
        debug!(keyword = %body.keyword, "POST /search");
        self.send(self.request(Method::POST, "/search").json(body))
            .await
    }

    pub async fn list_rfps(&self) -> Result<Vec<RfpRecord>, ApiError> {
        debug!("GET /api/rfp-list");
        let body: RfpListBody = self
            .send(self.request(Method::GET, "/api/rfp-list"))
            .await?;
        Ok(body.rfps)
    }

    pub async fn create_rfp(&self, rfp: &NewRfp) -> Result<RfpRecord, ApiError> {
        debug!(name = %rfp.project_name, "POST /api/rfp-create");
        let body: RfpBody = self
            .send(self.request(Method::POST, "/api/rfp-create").json(rfp))
            .await?;
        body.rfp.ok_or(ApiError::Server { message: None })
    }

    pub async fn update_rfp(&self, id: i64, form: &RfpForm) -> Result<RfpRecord, ApiError> {
        debug!(id, "PUT /api/rfp-update");
        let body: RfpBody = self
            .send(
                self.request(Method::PUT, &format!("/api/rfp-update/{id}"))
                    .json(form),
            )
            .await?;
        body.rfp.ok_or(ApiError::Server { message: None })
    }

    pub async fn delete_rfp(&self, id: i64) -> Result<Option<String>, ApiError> {
        debug!(id, "DELETE /api/rfp-delete");
        let body: MessageBody = self
            .send(self.request(Method::DELETE, &format!("/api/rfp-delete/{id}")))
            .await?;
        Ok(body.message)
    }

    pub async fn documents(&self, rfp_id: i64) -> Result<Vec<Document>, ApiError> {
        debug!(rfp_id, "GET /api/documents");
        let body: DocumentsBody = self
            .send(self.request(Method::GET, &format!("/api/documents/{rfp_id}")))
            .await?;
        Ok(body.documents)
    }

    pub async fn upload_document(
        &self,
        rfp_id: i64,
        file: &UploadFile,
    ) -> Result<Document, ApiError> {
        debug!(rfp_id, name = %file.name, size = file.size(), "POST /api/document-upload");
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = reqwest::multipart::Form::new().part("document", part);
        let body: DocumentBody = self
            .send(
                self.request(Method::POST, &format!("/api/document-upload/{rfp_id}"))
                    .multipart(form),
            )
            .await?;
        Ok(body.document.unwrap_or_else(|| Document {
            rfp_id: Some(rfp_id),
            document_name: file.name.clone(),
            ..Default::default()
        }))
    }

    pub async fn delete_document(&self, id: i64) -> Result<DocumentDeleted, ApiError> {
        debug!(id, "DELETE /api/document-delete");
        self.send(self.request(Method::DELETE, &format!("/api/document-delete/{id}")))
            .await
    }

    pub async fn analyze(&self, rfp_id: i64) -> Result<AnalysisOutcome, ApiError> {
        debug!(rfp_id, "POST /api/ai-analyze");
        self.send(self.request(Method::POST, &format!("/api/ai-analyze/{rfp_id}")))
            .await
    }

    /// `find-members` returns the matching object itself rather than wrapping it,
    /// so `success` belongs to the body here.
    pub async fn find_members(&self, rfp_id: i64) -> Result<MemberMatching, ApiError> {
        debug!(rfp_id, "POST /api/rfp/find-members");
        let matching: MemberMatching = Self::read_json(
            self.request(Method::POST, &format!("/api/rfp/{rfp_id}/find-members")),
        )
        .await?;
        if !matching.success {
            return Err(ApiError::Server {
                message: matching.error,
            });
        }
        Ok(matching)
    }

    pub async fn init_knowledge_base(&self) -> Result<KnowledgeBaseInit, ApiError> {
        debug!("POST /api/init-knowledge-base");
        self.send(
            self.request(Method::POST, "/api/init-knowledge-base")
                .json(&serde_json::json!({})),
        )
        .await
    }

    pub async fn knowledge_base_status(&self) -> Result<KnowledgeBaseStatus, ApiError> {
        debug!("GET /api/knowledge-base-status");
        self.send(self.request(Method::GET, "/api/knowledge-base-status"))
            .await
    }

    pub async fn scrape(&self, source: TenderSource) -> Result<Option<String>, ApiError> {
        let path = format!("/api/tenders/scrape-{}", source.slug());
        debug!(%path, "POST scrape");
        let body: ScrapeBody = Self::read_json(self.request(Method::POST, &path)).await?;
        body.into_result()
    }

    pub async fn list_tenders(
        &self,
        source: Option<TenderSource>,
        filter: TenderFilter,
    ) -> Result<Vec<Tender>, ApiError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(source) = source {
            query.push(("source", source.label()));
        }
        if let Some(processed) = filter.processed_param() {
            query.push(("processed", processed));
        }
        debug!(?query, "GET /api/tenders/list");
        let body: TendersBody = self
            .send(
                self.request(Method::GET, "/api/tenders/list")
                    .query(&query),
            )
            .await?;
        Ok(body.tenders)
    }

    pub async fn mark_processed(
        &self,
        tender_id: i64,
        processed: bool,
    ) -> Result<Option<String>, ApiError> {
        debug!(tender_id, processed, "POST /api/tenders/mark-processed");
        let body: MessageBody = self
            .send(
                self.request(Method::POST, "/api/tenders/mark-processed")
                    .json(&MarkProcessed {
                        tender_id,
                        processed,
                    }),
            )
            .await?;
        Ok(body.message)
    }

    pub async fn tender_stats(&self) -> Result<TenderStats, ApiError> {
        debug!("GET /api/tenders/stats");
        self.send(self.request(Method::GET, "/api/tenders/stats"))
            .await
    }
}
