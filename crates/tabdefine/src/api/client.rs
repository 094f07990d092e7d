//! Table API trait and the blocking HTTP client.

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;
use crate::schema::SchemaDocument;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://openenergy-platform.org/api/v0/";

/// Default target schema.
pub const DEFAULT_SCHEMA: &str = "model_draft";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "TABDEFINE_TOKEN";

/// One row to insert, keyed by lower-case column name. `None` is sent as `null`.
pub type Row = IndexMap<String, Option<String>>;

/// Operations on a single remote table.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait TableApi: Send + Sync {
    /// Schema the table lives in.
    fn schema(&self) -> &str;

    /// Table name.
    fn table(&self) -> &str;

    /// Whether the table exists.
    fn table_exists(&self) -> Result<bool, ApiError>;

    /// Create the table from a definition document.
    fn create_table(&self, document: &SchemaDocument) -> Result<(), ApiError>;

    /// Insert the row at zero-based `index`.
    fn insert_row(&self, index: usize, row: &Row) -> Result<(), ApiError>;

    /// Delete the table.
    fn delete_table(&self) -> Result<(), ApiError>;
}

/// Connection settings for [`OepClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://openenergy-platform.org/api/v0/`.
    pub api_url: String,
    pub schema: String,
    pub table: String,
    /// Sent as `Authorization: Token <token>`.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Settings for a table in the default schema.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: table.into(),
            token: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{api_url}schema/{schema}/tables/{table}/`
    pub fn table_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        format!("{}/schema/{}/tables/{}/", base, self.schema, self.table)
    }

    /// `{table_url}rows/{index + 1}`
    pub fn row_url(&self, index: usize) -> String {
        format!("{}rows/{}", self.table_url(), index + 1)
    }
}

/// Blocking client for the table API.
pub struct OepClient {
    client: Client,
    config: ClientConfig,
}

impl OepClient {
    /// Create a client. Fails if the token is not a valid header value.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(Self::build_headers(&config)?)
            .build()
            .map_err(|e| ApiError::Transport {
                url: config.api_url.clone(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_headers(config: &ClientConfig) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Token {}", token))
                .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Response, ApiError> {
        debug!("{} {}", method, url);
        request.send().map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })
    }

    fn expect_status(
        method: &str,
        url: &str,
        response: Response,
        expected: StatusCode,
    ) -> Result<(), ApiError> {
        let actual = response.status();
        if actual == expected {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(ApiError::UnexpectedStatus {
            method: method.to_string(),
            url: url.to_string(),
            expected: expected.as_u16(),
            actual: actual.as_u16(),
            body,
        })
    }
}

impl TableApi for OepClient {
    fn schema(&self) -> &str {
        &self.config.schema
    }

    fn table(&self) -> &str {
        &self.config.table
    }

    fn table_exists(&self) -> Result<bool, ApiError> {
        let url = self.config.table_url();
        let response = self.send("GET", &url, self.client.get(&url))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Self::expect_status("GET", &url, response, StatusCode::OK).map(|_| false),
        }
    }

    fn create_table(&self, document: &SchemaDocument) -> Result<(), ApiError> {
        let url = self.config.table_url();
        let response = self.send("PUT", &url, self.client.put(&url).json(document))?;
        Self::expect_status("PUT", &url, response, StatusCode::CREATED)
    }

    fn insert_row(&self, index: usize, row: &Row) -> Result<(), ApiError> {
        let url = self.config.row_url(index);
        let body = json!({ "query": row });
        let response = self.send("PUT", &url, self.client.put(&url).json(&body))?;
        Self::expect_status("PUT", &url, response, StatusCode::CREATED)
    }

    fn delete_table(&self) -> Result<(), ApiError> {
        let url = self.config.table_url();
        let response = self.send("DELETE", &url, self.client.delete(&url))?;
        Self::expect_status("DELETE", &url, response, StatusCode::OK)
    }
}
