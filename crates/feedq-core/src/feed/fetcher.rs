use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::models::RawEntry;
use super::parser::parse_entries;
use crate::config::SyncConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEED_ACCEPT: &str =
    "application/atom+xml,application/rss+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5";

/// Source of feed entries for the fetch scheduler.
///
/// Implementations report failures to the caller and never retry; the
/// scheduler simply tries again on its next tick.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// HTTP feed fetcher
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Self::build_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self { client })
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("feedq/", env!("CARGO_PKG_VERSION"))),
        );

        Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Http)
    }

    /// Download the raw feed document
    pub async fn fetch_raw(&self, url: &str) -> Result<Bytes> {
        let url = Url::parse(url)?;

        tracing::debug!("Fetching feed from: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::FeedFetch(format!("HTTP {} for URL: {}", status, url)));
        }

        if let Some(len) = response.content_length() {
            ensure_content_size(len as usize, url.as_str())?;
        }

        let content = response.bytes().await?;
        ensure_content_size(content.len(), url.as_str())?;

        Ok(content)
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        let content = self.fetch_raw(url).await?;
        parse_entries(&content)
    }
}

fn ensure_content_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::FeedFetch(format!(
            "Feed too large ({} bytes) for URL: {}",
            size, url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> FeedFetcher {
        FeedFetcher::new(&SyncConfig::default()).unwrap()
    }

    fn sample_rss() -> &'static str {
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>http://e</link><description>d</description>
<item><title>A</title><link>http://e/1</link><guid>http://e/1</guid></item>
<item><title>B</title><link>http://e/2</link></item>
</channel></rss>"#
    }

    #[tokio::test]
    async fn test_fetch_parses_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml")
                    .set_body_string(sample_rss()),
            )
            .mount(&server)
            .await;

        let entries = fetcher()
            .fetch(&format!("{}/feed", server.uri()))
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], RawEntry::new("http://e/1", 1, "A"));
        assert_eq!(entries[1], RawEntry::new("http://e/2", 2, "B"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&format!("{}/feed", server.uri())).await;
        assert!(matches!(result, Err(Error::FeedFetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("definitely not xml"))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&format!("{}/feed", server.uri())).await;
        assert!(matches!(result, Err(Error::FeedParse(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let result = fetcher().fetch("not a url").await;
        assert!(matches!(result, Err(Error::UrlParse(_))));
    }

    #[test]
    fn test_content_size_limit() {
        assert!(ensure_content_size(MAX_FEED_BYTES, "u").is_ok());
        assert!(ensure_content_size(MAX_FEED_BYTES + 1, "u").is_err());
    }
}
