use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::models::{ApiConfig, FetchRequest, FetchResponse};
use crate::domain::{MediaKind, PostMetadata};

const FETCH_PATH: &str = "/api/fetch";
const PROXY_IMAGE_PATH: &str = "/api/proxy_image";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{0}")]
    ApiError(String),

    #[error("Server responded with status {0}")]
    HttpStatus(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });
        Self { config, http }
    }

    fn endpoint(&self, path: &str, target: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))?;
        if let Some(target) = target {
            url.query_pairs_mut().append_pair("url", target);
        }
        Ok(url)
    }

    /// URL of the backend pass-through for a remote thumbnail.
    pub fn proxy_image_url(&self, thumbnail_url: &str) -> Result<Url> {
        self.endpoint(PROXY_IMAGE_PATH, Some(thumbnail_url))
    }

    pub fn download_url(&self, kind: MediaKind, original_url: &str) -> Result<Url> {
        self.endpoint(kind.endpoint(), Some(original_url))
    }

    /// Ask the backend for title, thumbnail and canonical URL of a post.
    /// Failures come back as `{error}` with a 5xx status, so the body is
    /// decoded before the status is looked at.
    pub async fn fetch_metadata(&self, post_url: &str) -> Result<PostMetadata> {
        let endpoint = self.endpoint(FETCH_PATH, None)?;
        debug!(%endpoint, post_url, "fetching post metadata");

        let response = self
            .http
            .post(endpoint)
            .timeout(self.config.request_timeout)
            .json(&FetchRequest { url: post_url })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let parsed: FetchResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(ApiError::HttpStatus(status.as_u16())),
            Err(e) => {
                return Err(ApiError::InvalidResponse(format!(
                    "JSON decode error: {}",
                    e
                )))
            }
        };

        if let Some(error) = parsed.error {
            return Err(ApiError::ApiError(error));
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        parsed
            .into_metadata()
            .ok_or_else(|| ApiError::InvalidResponse("original_url missing".to_string()))
    }

    /// Start a streamed download of one media kind.
    /// Returns (total_size, stream); the size is `None` when the server does
    /// not declare a usable `Content-Length`.
    pub async fn download_stream(
        &self,
        kind: MediaKind,
        original_url: &str,
    ) -> Result<(Option<u64>, BoxStream<'static, Result<bytes::Bytes>>)> {
        let endpoint = self.download_url(kind, original_url)?;
        debug!(%endpoint, %kind, "starting download");

        let response = Self::check_status(self.http.get(endpoint).send().await?).await?;

        let total_size = response.content_length().filter(|&size| size > 0);
        debug!(?total_size, %kind, "download response received");

        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();
        Ok((total_size, stream))
    }

    /// Load a thumbnail through the image proxy.
    pub async fn fetch_thumbnail(&self, thumbnail_url: &str) -> Result<bytes::Bytes> {
        let endpoint = self.proxy_image_url(thumbnail_url)?;
        let response = self
            .http
            .get(endpoint)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        Ok(Self::check_status(response).await?.bytes().await?)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        match serde_json::from_slice::<FetchResponse>(&body) {
            Ok(FetchResponse {
                error: Some(error), ..
            }) => Err(ApiError::ApiError(error)),
            _ => Err(ApiError::HttpStatus(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(ApiConfig::with_base_url(server.url()))
    }

    #[test]
    fn test_proxy_url_encodes_thumbnail() {
        let client = ApiClient::new(ApiConfig::default());
        let url = client.proxy_image_url("https://x/y.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5001/api/proxy_image?url=https%3A%2F%2Fx%2Fy.jpg"
        );
    }

    #[test]
    fn test_download_url_per_kind() {
        let client = ApiClient::new(ApiConfig::with_base_url("https://api.example.com/"));
        let video = client
            .download_url(MediaKind::Video, "https://instagram.com/p/ABC")
            .unwrap();
        let audio = client
            .download_url(MediaKind::Audio, "https://instagram.com/p/ABC")
            .unwrap();
        assert_eq!(
            video.as_str(),
            "https://api.example.com/api/download_video?url=https%3A%2F%2Finstagram.com%2Fp%2FABC"
        );
        assert_eq!(audio.path(), "/api/download_audio");
    }

    #[tokio::test]
    async fn test_fetch_metadata_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/fetch")
            .match_body(Matcher::Json(json!({"url": "https://instagram.com/p/ABC"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "title": "Sample",
                    "uploader": "someone",
                    "thumbnail": "https://x/y.jpg",
                    "original_url": "https://instagram.com/p/ABC"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let metadata = client_for(&server)
            .fetch_metadata("https://instagram.com/p/ABC")
            .await
            .unwrap();
        assert_eq!(metadata.title, "Sample");
        assert_eq!(metadata.original_url, "https://instagram.com/p/ABC");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_metadata_server_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/fetch")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Unsupported URL"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_metadata("https://example.com/nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ApiError(ref msg) if msg == "Unsupported URL"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_non_json_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/fetch")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_metadata("https://instagram.com/p/ABC")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(502)));
    }

    #[tokio::test]
    async fn test_download_stream_reports_content_length() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![7u8; 4096];
        let mock = server
            .mock("GET", "/api/download_audio")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://instagram.com/p/ABC".into(),
            ))
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let (total, stream) = client_for(&server)
            .download_stream(MediaKind::Audio, "https://instagram.com/p/ABC")
            .await
            .unwrap();
        assert_eq!(total, Some(4096));

        let chunks: Vec<_> = stream.collect().await;
        let received: usize = chunks.iter().map(|c| c.as_ref().unwrap().len()).sum();
        assert_eq!(received, 4096);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_stream_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/download_video")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"yt-dlp failed"}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .download_stream(MediaKind::Video, "https://instagram.com/p/ABC")
            .await;
        match result {
            Err(ApiError::ApiError(msg)) => assert_eq!(msg, "yt-dlp failed"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("download should have failed"),
        }
    }

    #[tokio::test]
    async fn test_fetch_thumbnail_through_proxy() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/proxy_image")
            .match_query(Matcher::UrlEncoded("url".into(), "https://x/y.jpg".into()))
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body([1u8, 2, 3])
            .create_async()
            .await;

        let bytes = client_for(&server)
            .fetch_thumbnail("https://x/y.jpg")
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
        mock.assert_async().await;
    }
}
