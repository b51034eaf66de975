//! Preservation North Carolina property listings.

mod crawler;
mod data;
mod price;

pub use crawler::{parse_listing_id, PresncCrawler, PropertyListings, INDEX_URL};
pub use data::{PresncData, PropertyTable};
pub use price::parse_price;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub location: Site,
}

/// Where a property is. Coordinates are left for a geocoding step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub address: String,
    pub city: String,
    pub county: String,
    pub state: String,
    #[serde(rename = "zip")]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id        : {}", self.id)?;
        writeln!(f, "Name      : {}", self.name)?;
        if let Some(price) = self.price {
            writeln!(f, "Price     : ${:.2}", price)?;
        } else {
            writeln!(f, "Price     : None")?;
        }
        writeln!(f, "Address   : {}", self.location.address)?;
        writeln!(
            f,
            "City      : {}, {} {}",
            self.location.city, self.location.state, self.location.postal_code
        )?;
        writeln!(f, "County    : {}", self.location.county)?;
        if !self.description.is_empty() {
            writeln!(f, "Description : ")?;
            writeln!(f, "> {}", self.description.replace('\n', "\n  "))?;
        }

        Ok(())
    }
}
