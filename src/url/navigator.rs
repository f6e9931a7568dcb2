//! Page navigation through a numeric query parameter

use crate::ConfigError;
use regex::Regex;

/// A seed URL with its navigation parameter taken out
///
/// Galleries select a page through a query parameter (the navigator, `git` by
/// default). When the seed URL already carries one, its value becomes the first
/// page and the term is removed so that re-appending the page number each
/// iteration never produces a duplicated parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUrl {
    base: String,
    navigator: String,
    initial_page: Option<u32>,
}

impl SeedUrl {
    /// Splits the navigation parameter out of `seed`
    ///
    /// A term matches when it is introduced by `?`, `&` or `#`, has a purely
    /// numeric value and is followed by `&` or the end of the URL. Only the first
    /// occurrence is considered.
    ///
    /// # Examples
    ///
    /// ```
    /// use honey_dl::url::SeedUrl;
    ///
    /// let seed = SeedUrl::parse("https://x/g?id=1&git=7", "git").unwrap();
    /// assert_eq!(seed.initial_page(), Some(7));
    /// assert_eq!(seed.base(), "https://x/g?id=1");
    /// assert_eq!(seed.page_url(8), "https://x/g?id=1&git=8");
    /// ```
    pub fn parse(seed: &str, navigator: &str) -> Result<Self, ConfigError> {
        let pattern = format!(r"([?&#]){}=(\d+)(&|$)", regex::escape(navigator));
        let re = Regex::new(&pattern).map_err(|e| {
            ConfigError::Validation(format!("Invalid navigator '{}': {}", navigator, e))
        })?;

        let Some(caps) = re.captures(seed) else {
            return Ok(Self {
                base: seed.to_string(),
                navigator: navigator.to_string(),
                initial_page: None,
            });
        };

        let digits = &caps[2];
        let page: u32 = digits.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Page number '{}' in seed URL is out of range",
                digits
            ))
        })?;

        // Drop the term together with exactly one of its separators
        let separator = &caps[1];
        let tail = &caps[3];
        let keep = match (separator, tail) {
            ("&", tail) => tail,
            (separator, "&") => separator,
            _ => "",
        };

        let term = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        let mut base = String::with_capacity(seed.len());
        base.push_str(&seed[..term.start]);
        base.push_str(keep);
        base.push_str(&seed[term.end..]);

        Ok(Self {
            base,
            navigator: navigator.to_string(),
            initial_page: Some(page),
        })
    }

    /// The seed URL without its navigation term
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Page number found in the seed URL, if any
    pub fn initial_page(&self) -> Option<u32> {
        self.initial_page
    }

    /// Builds the URL of `page` by appending the navigation term to the base
    pub fn page_url(&self, page: u32) -> String {
        let separator = if self.base.ends_with('?') || self.base.ends_with('&') {
            ""
        } else if self.base.contains('?') {
            "&"
        } else {
            "?"
        };

        format!("{}{}{}={}", self.base, separator, self.navigator, page)
    }
}
