use crate::{UploadError, UploadReceipt, UploadRequest, Uploader};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct GithubConfig {
    pub api_base: String,
    /// `owner/name`
    pub repo: String,
    pub token: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Writes files through the repository contents API.
#[derive(Clone)]
pub struct GithubUploader {
    client: Client,
    cfg: Arc<GithubConfig>,
}

impl GithubUploader {
    pub fn new(cfg: GithubConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    /// Every path segment is percent-encoded, so `#`, `?` and spaces in
    /// file names stay part of the path.
    fn contents_url(&self, path: &str) -> Result<Url, UploadError> {
        let mut url = Url::parse(&self.cfg.api_base)
            .map_err(|e| UploadError::RequestFailed(format!("invalid api base: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                UploadError::RequestFailed(format!("invalid api base: {}", self.cfg.api_base))
            })?;
            segments
                .pop_if_empty()
                .push("repos")
                .extend(self.cfg.repo.split('/').filter(|s| !s.is_empty()))
                .push("contents")
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<ContentInfo>,
}

#[derive(Deserialize)]
struct ContentInfo {
    path: String,
    sha: Option<String>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

#[async_trait::async_trait]
impl Uploader for GithubUploader {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError> {
        #[derive(serde::Serialize)]
        struct PutContents<'a> {
            message: &'a str,
            content: String,
            branch: &'a str,
        }

        let body = PutContents {
            message: &request.message,
            content: STANDARD.encode(&request.content),
            branch: &request.branch,
        };

        let resp = self
            .client
            .put(self.contents_url(&request.path)?)
            .header("Authorization", format!("token {}", self.cfg.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "image-tagger")
            .json(&body)
            .send()
            .await
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| status.to_string());
            warn!(path = %request.path, status = status.as_u16(), %message, "upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;
        let receipt = match parsed.content {
            Some(info) => UploadReceipt {
                path: info.path,
                sha: info.sha,
                html_url: info.html_url,
            },
            None => UploadReceipt {
                path: request.path.clone(),
                ..UploadReceipt::default()
            },
        };
        info!(path = %receipt.path, "uploaded");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(server: &MockServer) -> GithubUploader {
        GithubUploader::new(GithubConfig {
            api_base: server.uri(),
            repo: "someone/photos".to_string(),
            token: "secret-token".to_string(),
        })
    }

    fn request() -> UploadRequest {
        UploadRequest {
            path: "images/cat.png".to_string(),
            message: "Add cat.png".to_string(),
            branch: "main".to_string(),
            content: Bytes::from_static(b"meow"),
        }
    }

    #[tokio::test]
    async fn puts_base64_content_with_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/someone/photos/contents/images/cat.png"))
            .and(header("Authorization", "token secret-token"))
            .and(body_json(serde_json::json!({
                "message": "Add cat.png",
                "content": "bWVvdw==",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "content": {
                    "path": "images/cat.png",
                    "sha": "abc123",
                    "html_url": "https://example.test/cat.png"
                },
                "commit": { "sha": "def456" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = uploader(&server).upload(&request()).await.unwrap();
        assert_eq!(receipt.path, "images/cat.png");
        assert_eq!(receipt.sha.as_deref(), Some("abc123"));
        assert_eq!(receipt.html_url.as_deref(), Some("https://example.test/cat.png"));
    }

    #[tokio::test]
    async fn remote_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({ "message": "sha wasn't supplied" })),
            )
            .mount(&server)
            .await;

        let err = uploader(&server).upload(&request()).await.unwrap_err();
        match err {
            UploadError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "sha wasn't supplied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn file_names_are_percent_encoded_in_the_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/someone/photos/contents/images/pic%20%231%3F.png"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "content": { "path": "images/pic #1?.png", "sha": "abc123" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let req = UploadRequest {
            path: "images/pic #1?.png".to_string(),
            ..request()
        };
        let receipt = uploader(&server).upload(&req).await.unwrap();
        assert_eq!(receipt.path, "images/pic #1?.png");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].url.query(), None);
        assert_eq!(received[0].url.fragment(), None);
    }

    #[test]
    fn contents_url_keeps_api_base_path() {
        let up = GithubUploader::new(GithubConfig {
            api_base: "https://ghe.example.test/api/v3/".to_string(),
            repo: "a/b".to_string(),
            token: String::new(),
        });
        assert_eq!(
            up.contents_url("/images/x y.png").unwrap().as_str(),
            "https://ghe.example.test/api/v3/repos/a/b/contents/images/x%20y.png"
        );
        let bad = GithubUploader::new(GithubConfig {
            api_base: "not a url".to_string(),
            repo: "a/b".to_string(),
            token: String::new(),
        });
        assert!(matches!(
            bad.contents_url("x.png"),
            Err(UploadError::RequestFailed(_))
        ));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let cfg = GithubConfig {
            api_base: "https://api.github.com".to_string(),
            repo: "a/b".to_string(),
            token: "hunter2".to_string(),
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
