use crate::CrawlerError;
use reqwest::StatusCode;
use std::time::Duration;

/// A fetched page. The body is read completely, so the connection is already
/// released when this is returned.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

#[async_trait::async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Page, CrawlerError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CrawlerError::RequestError {
                url: String::new(),
                source,
            })?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, CrawlerError> {
        let request_error = |source| CrawlerError::RequestError {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(request_error)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(request_error)?.to_vec();
        Ok(Page { status, body })
    }
}
