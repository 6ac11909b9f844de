//! Typed HTTP client for the REST API.
//!
//! Unwraps the `{success, data, meta}` envelope and turns error envelopes
//! into [`ClientError::Api`].

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::pagination::PageMeta;
use crate::web::{ApiResponse, Deleted};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    Url(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error {status} ({code}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
    code: String,
}

/// Page of records plus the server's pagination metadata.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

/// Query-string parameters for list calls. Unset values are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub statut: Option<String>,
    pub client_id: Option<Uuid>,
    pub technicien_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn statut(mut self, statut: impl Into<String>) -> Self {
        self.statut = Some(statut.into());
        self
    }

    pub fn client(mut self, client_id: Uuid) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn technicien(mut self, technicien_id: Uuid) -> Self {
        self.technicien_id = Some(technicien_id);
        self
    }

    pub fn mission(mut self, mission_id: Uuid) -> Self {
        self.mission_id = Some(mission_id);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(statut) = self.statut.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("statut", statut.to_string()));
        }
        if let Some(id) = self.client_id {
            pairs.push(("clientId", id.to_string()));
        }
        if let Some(id) = self.technicien_id {
            pairs.push(("technicienId", id.to_string()));
        }
        if let Some(id) = self.mission_id {
            pairs.push(("missionId", id.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> ClientResult<Self> {
        let mut base = Url::parse(base_url).map_err(|err| ClientError::Url(err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    fn resource_url(&self, resource: &str, id: Option<Uuid>) -> ClientResult<Url> {
        let path = match id {
            Some(id) => format!("api/{}/{id}", resource.trim_matches('/')),
            None => format!("api/{}", resource.trim_matches('/')),
        };
        self.base
            .join(&path)
            .map_err(|err| ClientError::Url(err.to_string()))
    }

    pub fn list_url(&self, resource: &str, query: &ListQuery) -> ClientResult<Url> {
        let mut url = self.resource_url(resource, None)?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ListQuery,
    ) -> ClientResult<Paginated<T>> {
        let url = self.list_url(resource, query)?;
        debug!(%url, "listing");
        let envelope: ApiResponse<Vec<T>> = decode(self.http.get(url).send().await?).await?;
        Ok(Paginated {
            items: envelope.data,
            meta: envelope.meta,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, resource: &str, id: Uuid) -> ClientResult<T> {
        let url = self.resource_url(resource, Some(id))?;
        let envelope: ApiResponse<T> = decode(self.http.get(url).send().await?).await?;
        Ok(envelope.data)
    }

    pub async fn create<B, T>(&self, resource: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resource_url(resource, None)?;
        let envelope: ApiResponse<T> =
            decode(self.http.post(url).json(body).send().await?).await?;
        Ok(envelope.data)
    }

    pub async fn delete(&self, resource: &str, id: Uuid) -> ClientResult<Uuid> {
        let url = self.resource_url(resource, Some(id))?;
        let envelope: ApiResponse<Deleted> = decode(self.http.delete(url).send().await?).await?;
        Ok(envelope.data.id)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => Err(ClientError::Api {
            status,
            code: envelope.code,
            message: envelope.error,
        }),
        Err(_) => Err(ClientError::Api {
            status,
            code: "http_error".to_string(),
            message: String::from_utf8_lossy(&bytes).into_owned(),
        }),
    }
}
