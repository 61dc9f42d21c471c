use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION, CONTENT_RANGE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl DatabaseError {
    fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => DatabaseError::Auth(body),
            404 => DatabaseError::NotFound(body),
            409 => DatabaseError::Conflict(body),
            code => DatabaseError::Api { status: code, message: body },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // PostgREST falls back to the anon role when no bearer token is given
        let bearer = auth_token.unwrap_or(&self.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(DatabaseError::from_status(status, error_text));
        }

        let data = response.json::<T>().await
            .map_err(|e| DatabaseError::Decode(e.to_string()))?;
        Ok(data)
    }

    /// Exact row count for a filtered table path, read from the
    /// `Content-Range` header of a `HEAD` request.
    pub async fn count(&self, path: &str, auth_token: Option<&str>) -> Result<u64, DatabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Counting rows at {}", url);

        let mut headers = self.get_headers(auth_token)?;
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.client.request(Method::HEAD, &url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Count request failed ({})", status);
            return Err(DatabaseError::from_status(status, format!("count request to {} failed", path)));
        }

        let content_range = response.headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DatabaseError::Decode("missing Content-Range header".to_string()))?;

        parse_content_range_total(content_range)
    }

    /// Headers asking PostgREST to echo the affected rows back.
    pub fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_content_range_total(content_range: &str) -> Result<u64, DatabaseError> {
    // Formats: "0-24/57", "*/0"
    content_range
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| DatabaseError::Decode(format!("unparseable Content-Range '{}'", content_range)))
}
