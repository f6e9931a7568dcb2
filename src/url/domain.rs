use url::Url;

/// Name of the directory downloads for `url` are stored under
///
/// This is the URL's network location: the lowercase host, followed by
/// `:port` when the URL spells out a non-default port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use honey_dl::url::domain_root_name;
///
/// let url = Url::parse("https://Gallery.Example.com/view?id=1").unwrap();
/// assert_eq!(domain_root_name(&url), Some("gallery.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/view").unwrap();
/// assert_eq!(domain_root_name(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn domain_root_name(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Resolves an image `src` attribute against the page it was found on
///
/// Absolute URLs pass through unchanged. Returns `None` for values that cannot
/// be resolved or that do not point at an http(s) resource.
pub fn resolve_item_url(src: &str, page_url: &Url) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let resolved = page_url.join(src).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
