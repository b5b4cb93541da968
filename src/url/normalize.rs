use crate::UrlError;
use url::Url;

/// Canonicalizes a listing link into its identity key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host (the parser lowercases it)
/// 4. Keep scheme, host, port and path; drop query string and fragment
///
/// Two hrefs that differ only in tracking parameters or fragments map to the
/// same key, so a listing re-rendered with a fresh `?ref=` token is still
/// recognized as already seen.
///
/// # Arguments
///
/// * `href` - The raw link as read from the page
///
/// # Returns
///
/// * `Ok(String)` - The canonical link
/// * `Err(UrlError)` - The href could not be parsed or has no usable host
///
/// # Examples
///
/// ```
/// use listing_harvester::url::canonical_link;
///
/// let link = canonical_link("https://WWW.Example.com/marketplace/item/42/?ref=feed#top").unwrap();
/// assert_eq!(link, "https://www.example.com/marketplace/item/42/");
/// ```
pub fn canonical_link(href: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(href.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

/// Parses a harvest target URL from configuration
///
/// Unlike [`canonical_link`] the query string is kept, since listing pages
/// usually encode their search filters there.
pub fn parse_target_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
