use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::PostMetadata;

const DEFAULT_BASE_URL: &str = "http://localhost:5001";
const BASE_URL_VAR: &str = "INSTA_API_URL";

/// Body of `POST /api/fetch`
#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
}

/// Response from the /api/fetch endpoint. Either `error` is set or the
/// metadata fields are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

impl FetchResponse {
    /// `None` when the backend left out the post URL.
    pub fn into_metadata(self) -> Option<PostMetadata> {
        Some(PostMetadata {
            title: self.title.unwrap_or_default(),
            thumbnail_url: self.thumbnail.unwrap_or_default(),
            original_url: self.original_url.filter(|url| !url.is_empty())?,
            uploader: self.uploader.filter(|name| !name.is_empty()),
        })
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Applies to metadata and thumbnail requests. Downloads only get a
    /// connect timeout since the backend transcodes before it answers.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Runtime `INSTA_API_URL` wins over the value baked in at build time.
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| option_env!("INSTA_API_URL").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url.trim())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_becomes_metadata() {
        let response: FetchResponse = serde_json::from_str(
            r#"{"title":"Sample","uploader":"someone","thumbnail":"https://x/y.jpg","original_url":"https://instagram.com/p/ABC"}"#,
        )
        .unwrap();
        assert!(response.error.is_none());
        let metadata = response.into_metadata().unwrap();
        assert_eq!(metadata.title, "Sample");
        assert_eq!(metadata.thumbnail_url, "https://x/y.jpg");
        assert_eq!(metadata.uploader.as_deref(), Some("someone"));
    }

    #[test]
    fn test_null_title_is_tolerated() {
        let response: FetchResponse = serde_json::from_str(
            r#"{"title":null,"thumbnail":null,"original_url":"https://instagram.com/p/ABC"}"#,
        )
        .unwrap();
        let metadata = response.into_metadata().unwrap();
        assert_eq!(metadata.title, "");
        assert_eq!(metadata.thumbnail_url, "");
        assert_eq!(metadata.uploader, None);
    }

    #[test]
    fn test_missing_original_url_is_not_metadata() {
        let response: FetchResponse = serde_json::from_str(r#"{"title":"Sample"}"#).unwrap();
        assert!(response.into_metadata().is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ApiConfig::with_base_url("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn test_default_base_url_is_local() {
        assert_eq!(ApiConfig::default().base_url, "http://localhost:5001");
    }
}
