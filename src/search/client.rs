//! Index client - the only piece that talks to the search engine / 索引客户端

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::ElasticsearchConfig;
use crate::error::{Result, SearchError};
use super::query::SearchBody;
use super::response::RawSearchResult;

/// Executes a search body against a named index / 执行索引查询
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn search(&self, index: &str, body: &SearchBody) -> Result<RawSearchResult>;
}

/// HTTP client for an Elasticsearch-compatible engine / Elasticsearch 客户端
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl ElasticsearchClient {
    pub fn new(config: &ElasticsearchConfig) -> anyhow::Result<Self> {
        validate_index_name(&config.index)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut base_url = Url::parse(&config.url)?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let credentials = config
            .username
            .clone()
            .map(|user| (user, config.password.clone().unwrap_or_default()));

        Ok(Self { client, base_url, credentials })
    }

    pub fn search_url(&self, index: &str) -> Result<Url> {
        validate_index_name(index)?;
        self.base_url
            .join(&format!("{}/_search", index))
            .map_err(|e| SearchError::IndexName { index: index.to_string(), reason: e.to_string() })
    }
}

/// Engine naming rules, which also keep the name a single URL path segment / 索引名校验
fn validate_index_name(index: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(SearchError::IndexName { index: index.to_string(), reason: reason.to_string() })
    };

    if index.is_empty() || index == "." || index == ".." {
        return reject("empty or relative name");
    }
    if index.starts_with(['-', '_', '+']) {
        return reject("must not start with '-', '_' or '+'");
    }
    if let Some(c) = index
        .chars()
        .find(|c| c.is_uppercase() || c.is_whitespace() || "\\/*?\"<>|,#:%".contains(*c))
    {
        return reject(&format!("illegal character {:?}", c));
    }
    Ok(())
}

/// Error bodies are diagnostic only; a failed read still says why / 读取错误响应体
async fn error_body(resp: reqwest::Response) -> String {
    resp.text()
        .await
        .unwrap_or_else(|e| format!("<unreadable error body: {}>", e))
}

#[async_trait]
impl IndexClient for ElasticsearchClient {
    async fn search(&self, index: &str, body: &SearchBody) -> Result<RawSearchResult> {
        let url = self.search_url(index)?;

        let mut request = self.client.post(url).json(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(SearchError::Engine { status: status.as_u16(), body });
        }

        Ok(resp.json::<RawSearchResult>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ElasticsearchConfig {
        ElasticsearchConfig {
            url: url.to_string(),
            ..ElasticsearchConfig::default()
        }
    }

    #[test]
    fn test_search_url() {
        let client = ElasticsearchClient::new(&config("http://127.0.0.1:9200")).unwrap();
        assert_eq!(client.search_url("hotel").unwrap().as_str(), "http://127.0.0.1:9200/hotel/_search");

        let client = ElasticsearchClient::new(&config("http://es.local/proxy")).unwrap();
        assert_eq!(client.search_url("hotel").unwrap().as_str(), "http://es.local/proxy/hotel/_search");
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(ElasticsearchClient::new(&config("not a url")).is_err());
    }

    #[test]
    fn test_bad_index_name() {
        let client = ElasticsearchClient::new(&config("http://127.0.0.1:9200")).unwrap();
        for index in ["", "..", "Hotel", "hotel/../other", "hotel?pretty", "_all", "ho tel"] {
            match client.search_url(index) {
                Err(SearchError::IndexName { index: name, .. }) => assert_eq!(name, index),
                other => panic!("expected index name error for {:?}, got {:?}", index, other),
            }
        }
        assert!(client.search_url("hotel_v2.2024-01").is_ok());

        let mut cfg = config("http://127.0.0.1:9200");
        cfg.index = "Hotel".to_string();
        let err = ElasticsearchClient::new(&cfg).err().unwrap();
        assert!(matches!(err.downcast_ref::<SearchError>(), Some(SearchError::IndexName { .. })));
    }

    #[tokio::test]
    async fn test_bad_index_name_is_not_transport_failure() {
        let client = ElasticsearchClient::new(&config("http://127.0.0.1:9")).unwrap();
        let body = crate::search::query::compile(&Default::default()).body;

        let err = client.search("a/b", &body).await.unwrap_err();
        assert!(!err.is_transport());
        assert!(matches!(err, SearchError::IndexName { .. }));
    }

    /// Answers a single request with a fixed raw HTTP response
    async fn serve_once(response: &'static [u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the whole request so closing the socket does not reset it
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_engine_error_body_is_kept() {
        let url = serve_once(
            b"HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: 23\r\nConnection: close\r\n\r\n{\"error\":\"parse error\"}",
        )
        .await;
        let client = ElasticsearchClient::new(&config(&url)).unwrap();
        let body = crate::search::query::compile(&Default::default()).body;

        match client.search("hotel", &body).await {
            Err(SearchError::Engine { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, r#"{"error":"parse error"}"#);
            }
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_error_body_reports_read_failure() {
        // Promises 100 bytes and closes after 5
        let url = serve_once(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
        )
        .await;
        let client = ElasticsearchClient::new(&config(&url)).unwrap();
        let body = crate::search::query::compile(&Default::default()).body;

        match client.search("hotel", &body).await {
            Err(SearchError::Engine { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<unreadable error body:"), "got {:?}", body);
            }
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_failure() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let mut cfg = config("http://127.0.0.1:9");
        cfg.timeout_secs = 2;
        let client = ElasticsearchClient::new(&cfg).unwrap();

        let body = crate::search::query::compile(&Default::default()).body;
        let err = client.search("hotel", &body).await.unwrap_err();
        assert!(err.is_transport());
    }
}
