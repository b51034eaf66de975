#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("Request to {url} failed")]
    RequestError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed markup: {0}")]
    TokenizeError(String),

    #[error("Landmark not found: {0}")]
    LandmarkNotFound(String),

    #[error("Invalid price {0:?}")]
    PriceFormat(String),

    #[error("Invalid listing id {0:?}")]
    InvalidListingId(String),

    #[error("Listing {id} has no link")]
    MissingLink { id: String },

    #[error("Listing {id} has an invalid link {href:?}: {reason}")]
    InvalidLink {
        id: String,
        href: String,
        reason: String,
    },

    #[error("Invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl CrawlerError {
    /// Transport failures and non-success responses.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            CrawlerError::RequestError { .. } | CrawlerError::UnexpectedStatus { .. }
        )
    }

    /// Errors that only concern one listing container on the index page.
    /// The listing scan can carry on after them.
    pub(crate) fn is_listing_local(&self) -> bool {
        matches!(
            self,
            CrawlerError::InvalidListingId(_)
                | CrawlerError::MissingLink { .. }
                | CrawlerError::InvalidLink { .. }
        )
    }

    /// Id of the listing the error belongs to, when the listing got as far
    /// as having one.
    pub fn listing_id(&self) -> Option<&str> {
        match self {
            CrawlerError::MissingLink { id } | CrawlerError::InvalidLink { id, .. } => Some(id),
            _ => None,
        }
    }
}
