use async_trait::async_trait;
use reqwest::Url;

use crate::{
    config::ApiConfig,
    error::{Result, SkipError},
    types::{SkipRequest, SkipTimesResponse},
};

/// Anything that can answer a skip-times lookup.
#[async_trait]
pub trait SkipTimesSource: Send + Sync {
    async fn fetch(&self, request: &SkipRequest) -> Result<SkipTimesResponse>;
}

/// HTTP client for the AniSkip v2 API.
#[derive(Debug, Clone)]
pub struct AniSkipClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl AniSkipClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_http(builder.build()?, config))
    }

    /// Reuses an existing reqwest client; `config.timeout` is not applied.
    pub fn with_http(http: reqwest::Client, config: ApiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn skip_times_url(&self, request: &SkipRequest) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let raw = format!("{base}/v2/skip-times/{}/{}", request.mal_id, request.episode);
        let mut url =
            Url::parse(&raw).map_err(|e| SkipError::InvalidUrl(format!("{raw}: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            for skip_type in &self.config.types {
                query.append_pair("types[]", skip_type.as_str());
            }
            query.append_pair("episodeLength", &episode_length_param(request.episode_length));
        }

        Ok(url)
    }
}

/// The service reads 0 as "any length".
fn episode_length_param(length: Option<f64>) -> String {
    match length {
        Some(len) if len.is_finite() && len > 0.0 => len.to_string(),
        _ => "0".to_string(),
    }
}

#[async_trait]
impl SkipTimesSource for AniSkipClient {
    async fn fetch(&self, request: &SkipRequest) -> Result<SkipTimesResponse> {
        let url = self.skip_times_url(request)?;
        tracing::debug!(%url, "fetching skip times");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SkipError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::types::SkipType;

    /// Serves a single canned HTTP response and returns the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn client(base_url: &str) -> AniSkipClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        AniSkipClient::with_http(http, ApiConfig::default().with_base_url(base_url))
    }

    #[test]
    fn url_carries_every_type_and_episode_length() {
        let url = client("https://api.aniskip.com/")
            .skip_times_url(&SkipRequest::new(54744, 2))
            .unwrap();

        assert_eq!(url.path(), "/v2/skip-times/54744/2");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let types: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "types[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(types, ["ed", "mixed-ed", "mixed-op", "op", "recap"]);
        assert!(pairs.contains(&("episodeLength".to_string(), "0".to_string())));
    }

    #[test]
    fn url_uses_known_episode_length() {
        let mut config = ApiConfig::default();
        config.types = vec![SkipType::Op];
        let client = AniSkipClient::new(config).unwrap();

        let url = client
            .skip_times_url(&SkipRequest::new(1, 3).with_episode_length(1420.5))
            .unwrap();
        let query = url.query().unwrap_or_default().to_string();
        assert!(query.ends_with("episodeLength=1420.5"), "{query}");
        assert_eq!(url.query_pairs().filter(|(k, _)| k == "types[]").count(), 1);
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let err = client("not a url")
            .skip_times_url(&SkipRequest::new(1, 1))
            .unwrap_err();
        assert!(matches!(err, SkipError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn fetch_parses_successful_response() {
        let base = serve_once(
            "200 OK",
            r#"{"found":true,"results":[{"interval":{"startTime":0,"endTime":90},"skipType":"op","skipId":"x","episodeLength":1400}],"message":"ok","statusCode":200}"#,
        )
        .await;

        let response = client(&base).fetch(&SkipRequest::new(1, 1)).await.unwrap();
        assert!(response.found);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.episode_length(), 1400.0);
    }

    #[tokio::test]
    async fn fetch_rejects_non_success_status() {
        let base = serve_once(
            "404 Not Found",
            r#"{"found":false,"results":[],"message":"No skip times found","statusCode":404}"#,
        )
        .await;

        let err = client(&base).fetch(&SkipRequest::new(1, 1)).await.unwrap_err();
        match err {
            SkipError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fetch_reports_undecodable_body() {
        let base = serve_once("200 OK", "<html>maintenance</html>").await;

        let err = client(&base).fetch(&SkipRequest::new(1, 1)).await.unwrap_err();
        assert!(matches!(err, SkipError::Decode(_)));
    }
}
