use super::{parse_price, Property, Site};
use crate::locator::{Matcher, Scanner};
use crate::{Crawler, CrawlerError, Listing, TokenSource};
use lazy_regex::regex;
use lazy_static::lazy_static;
use reqwest::Url;

pub const INDEX_URL: &str = "https://www.presnc.org/property-listing/all-properties/";

const LISTING_PREFIX: &str = "property-";
const LISTING_SENTINEL: &str = "property-info";

lazy_static! {
    static ref CONTAINER: Matcher =
        Matcher::start_tag("div").with_attr_containing("id", LISTING_PREFIX);
    static ref ANCHOR: Matcher = Matcher::start_tag("a");
    static ref TITLE: Matcher = Matcher::start_tag("h1");
    static ref DETAILS: Matcher =
        Matcher::start_tag("div").with_attr("id", "single-property-info");
    static ref STREET_ADDRESS: Matcher = span_with_class("street-address");
    static ref LOCALITY: Matcher = span_with_class("locality");
    static ref REGION: Matcher = span_with_class("region");
    static ref POSTAL_CODE: Matcher = span_with_class("postal-code");
    static ref COUNTY: Matcher = span_with_class("county");
    static ref PRICE: Matcher = Matcher::start_tag("li");
}

fn span_with_class(class: &str) -> Matcher {
    Matcher::start_tag("span").with_attr_containing("class", class)
}

/// Identifier of a listing container, `property-1093` gives `1093`.
///
/// Returns `Ok(None)` for the `property-info` header, which is not a listing.
pub fn parse_listing_id(value: &str) -> Result<Option<String>, CrawlerError> {
    if value == LISTING_SENTINEL {
        return Ok(None);
    }
    regex!(r"^property-([A-Za-z0-9]+(?:[-_][A-Za-z0-9]+)*)$")
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|id| Some(id.as_str().to_string()))
        .ok_or_else(|| CrawlerError::InvalidListingId(value.to_string()))
}

#[derive(Debug, Clone)]
pub struct PresncCrawler {
    index_url: String,
    scoped: bool,
}

impl PresncCrawler {
    pub fn new(index_url: &str) -> Self {
        PresncCrawler {
            index_url: index_url.to_string(),
            scoped: true,
        }
    }

    /// Lets detail fields be found anywhere after the `single-property-info`
    /// marker instead of only inside it.
    pub fn unbounded(mut self) -> Self {
        self.scoped = false;
        self
    }
}

impl Default for PresncCrawler {
    fn default() -> Self {
        PresncCrawler::new(INDEX_URL)
    }
}

impl Crawler for PresncCrawler {
    type Document = Property;
    type Listings<S: TokenSource> = PropertyListings<S>;

    fn index_url(&self) -> &str {
        self.index_url.as_str()
    }

    fn listings<S: TokenSource>(&self, base: &Url, tokens: S) -> Self::Listings<S> {
        PropertyListings {
            page: Scanner::new(tokens),
            base: base.clone(),
        }
    }

    fn extract<S: TokenSource>(&self, id: &str, tokens: S) -> Result<Property, CrawlerError> {
        let mut page = Scanner::new(tokens);

        let name = page.text_after(&TITLE)?;

        page.find(&DETAILS)?;
        if self.scoped {
            page.enter_scope("div");
        }

        let address = page.text_after(&STREET_ADDRESS)?.trim().to_string();
        let city = page.text_after(&LOCALITY)?.trim().to_string();
        let state = page.text_after(&REGION)?.trim().to_string();
        let postal_code = page.text_after(&POSTAL_CODE)?.trim().to_string();
        let county = page.text_after(&COUNTY)?.trim().to_string();

        // not every listing has a price, parse_price deals with that
        let price = parse_price(page.text_after(&PRICE)?.trim())?;

        Ok(Property {
            id: id.to_string(),
            name,
            description: String::new(),
            price,
            location: Site {
                address,
                city,
                county,
                state,
                postal_code,
                longitude: None,
                latitude: None,
            },
        })
    }
}

/// Listings of an index page in document order.
///
/// Container errors (`InvalidListingId`, `MissingLink`) are yielded and the
/// scan goes on. Any other error ends it.
#[derive(Debug)]
pub struct PropertyListings<S> {
    page: Scanner<S>,
    base: Url,
}

impl<S: TokenSource> PropertyListings<S> {
    fn next_listing(&mut self) -> Result<Option<Listing>, CrawlerError> {
        while let Some(token) = self.page.next().transpose()? {
            if !CONTAINER.matches(&token) {
                continue;
            }
            let Some(value) = token.attr("id") else {
                continue;
            };
            let Some(id) = parse_listing_id(value)? else {
                continue;
            };

            // the link to the details is the next anchor after the container
            let anchor = self.page.find(&ANCHOR)?;
            let href = anchor
                .attr("href")
                .ok_or_else(|| CrawlerError::MissingLink { id: id.clone() })?;
            let url = self
                .base
                .join(href.trim())
                .map_err(|e| CrawlerError::InvalidLink {
                    id: id.clone(),
                    href: href.to_string(),
                    reason: e.to_string(),
                })?;

            return Ok(Some(Listing {
                id,
                url: url.to_string(),
            }));
        }
        Ok(None)
    }
}

impl<S: TokenSource> Iterator for PropertyListings<S> {
    type Item = Result<Listing, CrawlerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_listing().transpose()
    }
}
