use crate::CrawlerError;

/// Parses a listing price such as `$1,234,567`.
///
/// Text that does not start with `$` means the price is not disclosed and
/// gives `None`. A `$` followed by anything but a number is an error.
pub fn parse_price(raw: &str) -> Result<Option<f64>, CrawlerError> {
    let Some(amount) = raw.strip_prefix('$') else {
        return Ok(None);
    };
    let amount = amount.replace(',', "");
    match amount.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(Some(price)),
        _ => Err(CrawlerError::PriceFormat(raw.to_string())),
    }
}
