use reqwest::Url;
use tracing::{debug, info, warn};

pub mod fetch;
pub mod locator;
pub mod presnc;
pub mod token;

mod data;
mod error;
mod utils;

pub use data::Table;
pub use error::CrawlerError;
pub use fetch::{Fetcher, HttpFetcher, Page};
pub use token::{DocumentTokens, Token, TokenKind, TokenSource};

/// A detail page discovered on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub url: String,
}

pub trait Crawler {
    type Document: std::fmt::Debug;
    type Listings<S: TokenSource>: Iterator<Item = Result<Listing, CrawlerError>>;

    fn index_url(&self) -> &str;

    /// Scans the index page for listings, lazily and in document order.
    fn listings<S: TokenSource>(&self, base: &Url, tokens: S) -> Self::Listings<S>;

    /// Builds one record from the tokens of its detail page.
    fn extract<S: TokenSource>(&self, id: &str, tokens: S)
        -> Result<Self::Document, CrawlerError>;
}

#[async_trait::async_trait]
pub trait Storage {
    type Record: Send + Sync;

    async fn save(&self, records: &[Self::Record]) -> Result<usize, CrawlerError>;
    async fn load(&self) -> Result<Vec<Self::Record>, CrawlerError>;
    async fn clear(&self) -> Result<u64, CrawlerError>;
}

/// What to do when a single property cannot be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrawlPolicy {
    /// Stop the crawl and return the error. Nothing is returned for the
    /// properties that were already extracted.
    #[default]
    Strict,
    /// Log the failure, record it in [`CrawlOutcome::skipped`] and go on.
    Lenient,
}

#[derive(Debug)]
pub struct Skipped {
    pub id: Option<String>,
    pub error: CrawlerError,
}

#[derive(Debug)]
pub struct CrawlOutcome<D> {
    pub documents: Vec<D>,
    pub skipped: Vec<Skipped>,
}

impl<D> CrawlOutcome<D> {
    fn skip(
        &mut self,
        policy: CrawlPolicy,
        id: Option<String>,
        error: CrawlerError,
    ) -> Result<(), CrawlerError> {
        match policy {
            CrawlPolicy::Strict => Err(error),
            CrawlPolicy::Lenient => {
                warn!("Skip property {:?}: {}", id, error);
                self.skipped.push(Skipped { id, error });
                Ok(())
            }
        }
    }
}

/// Fetches `url` and tokenizes the body. Anything but a 2xx status is an
/// error.
pub async fn fetch_tokens<F>(fetcher: &F, url: &str) -> Result<DocumentTokens, CrawlerError>
where
    F: Fetcher + ?Sized,
{
    let page = fetcher.fetch(url).await?;
    if !page.status.is_success() {
        return Err(CrawlerError::UnexpectedStatus {
            url: url.to_string(),
            status: page.status,
        });
    }
    DocumentTokens::from_bytes(&page.body)
}

/// Crawls the index page of `crawler` and every listing on it, one page at a
/// time. Records keep the order of their listings on the index page.
#[tracing::instrument(name = "crawl", skip_all, fields(index = crawler.index_url()))]
pub async fn run_crawler<C, F>(
    crawler: &C,
    fetcher: &F,
    policy: CrawlPolicy,
) -> Result<CrawlOutcome<C::Document>, CrawlerError>
where
    C: Crawler,
    F: Fetcher + ?Sized,
{
    let index_url = crawler.index_url();
    let base = Url::parse(index_url).map_err(|e| CrawlerError::InvalidUrl {
        url: index_url.to_string(),
        reason: e.to_string(),
    })?;

    info!("Visit index {}", index_url);
    let tokens = fetch_tokens(fetcher, index_url).await?;

    let mut outcome = CrawlOutcome {
        documents: vec![],
        skipped: vec![],
    };
    for listing in crawler.listings(&base, tokens) {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) if e.is_listing_local() => {
                let id = e.listing_id().map(str::to_string);
                outcome.skip(policy, id, e)?;
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!("Visit {} for property {}", listing.url, listing.id);
        let result = match fetch_tokens(fetcher, &listing.url).await {
            Ok(tokens) => crawler.extract(&listing.id, tokens),
            Err(e) => Err(e),
        };
        match result {
            Ok(doc) => {
                info!("[{}] Extracted {}", outcome.documents.len() + 1, listing.url);
                outcome.documents.push(doc);
            }
            Err(e) => outcome.skip(policy, Some(listing.id), e)?,
        }
    }

    info!(
        "Crawl finished: {} extracted, {} skipped",
        outcome.documents.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}
