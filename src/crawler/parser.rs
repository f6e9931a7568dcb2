//! Gallery page parser
//!
//! This module turns a fetched gallery page into the list of images to download.
//! Images are `<img>` elements carrying the `img-thumbnail` class; the `alt`
//! attribute holds the image date as `DD-MM-YYYY` and `src` points at the file.

use crate::url::resolve_item_url;
use crate::ItemError;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use url::Url;

/// CSS selector matching gallery images
pub const IMAGE_SELECTOR: &str = "img.img-thumbnail";

/// Date format used in the `alt` attribute
const SOURCE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Date format used in filenames
const FILENAME_DATE_FORMAT: &str = "%Y-%m-%d";

/// An image discovered on a gallery page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageItem {
    /// Raw `alt` attribute, if present
    pub raw_date: Option<String>,

    /// Absolute URL of the image
    pub url: Url,
}

impl PageItem {
    /// Date to prefix the filename with, in `YYYY-MM-DD` form
    ///
    /// Returns `Ok(None)` when dates are disabled. A missing or malformed date
    /// is an error for this item only.
    pub fn filename_date(&self, add_dates: bool) -> Result<Option<String>, ItemError> {
        if !add_dates {
            return Ok(None);
        }

        let raw = self.raw_date.as_deref().ok_or(ItemError::MissingDate)?;
        canonical_date(raw).map(Some)
    }
}

/// Converts a `DD-MM-YYYY` date into `YYYY-MM-DD`
///
/// # Examples
///
/// ```
/// use honey_dl::crawler::canonical_date;
///
/// assert_eq!(canonical_date("05-11-2023").unwrap(), "2023-11-05");
/// assert!(canonical_date("2023-11-05").is_err());
/// ```
pub fn canonical_date(raw: &str) -> Result<String, ItemError> {
    NaiveDate::parse_from_str(raw.trim(), SOURCE_DATE_FORMAT)
        .map(|date| date.format(FILENAME_DATE_FORMAT).to_string())
        .map_err(|_| ItemError::Date {
            raw: raw.to_string(),
        })
}

/// Extracts the gallery images from a page body
///
/// Bytes are decoded leniently: invalid UTF-8 is replaced rather than
/// rejected. Elements without a usable `src` are skipped. An empty result is
/// not an error; it is how a gallery signals its end.
///
/// # Arguments
///
/// * `body` - The raw page body
/// * `page_url` - URL the page was fetched from, for resolving relative `src`
pub fn parse_page_items(body: &[u8], page_url: &Url) -> Vec<PageItem> {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    let Ok(selector) = Selector::parse(IMAGE_SELECTOR) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            tracing::debug!("Ignoring gallery image without src on {}", page_url);
            continue;
        };

        match resolve_item_url(src, page_url) {
            Some(url) => items.push(PageItem {
                raw_date: element.value().attr("alt").map(str::to_string),
                url,
            }),
            None => tracing::debug!(src, "Ignoring unresolvable image source"),
        }
    }

    items
}
