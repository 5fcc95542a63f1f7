use url::Url;

/// Extracts the domain scope from a URL string
///
/// The scope is the lowercase host, followed by `:port` when the URL names a
/// non-default port. Two URLs are on the same domain only when their scopes
/// are identical: `blog.example.com` is not in scope for `example.com`.
///
/// # Examples
///
/// ```
/// use ripple_qa::url::extract_domain;
///
/// assert_eq!(extract_domain("https://Example.COM/docs"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("http://127.0.0.1:8080/"), Some("127.0.0.1:8080".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    domain_of(&parsed)
}

/// Same as [`extract_domain`] for an already parsed URL
pub fn domain_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Brings a caller-supplied domain into the form [`extract_domain`] produces
///
/// Accepts a bare host (`Example.COM`, `example.com:443`) or a full URL.
/// Returns `None` for input that names no host.
///
/// # Examples
///
/// ```
/// use ripple_qa::url::normalize_domain;
///
/// assert_eq!(normalize_domain("Example.COM"), Some("example.com".to_string()));
/// assert_eq!(normalize_domain("example.com:443"), Some("example.com".to_string()));
/// assert_eq!(normalize_domain("example.com:8080"), Some("example.com:8080".to_string()));
/// ```
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains("://") {
        return extract_domain(raw);
    }

    // Parsed as http, so only :80 is dropped by the url crate
    let domain = extract_domain(&format!("http://{}/", raw))?;
    Some(match domain.strip_suffix(":443") {
        Some(host) => host.to_string(),
        None => domain,
    })
}

/// Returns true if `url` is on exactly `original_domain`
pub fn is_same_domain(url: &str, original_domain: &str) -> bool {
    !original_domain.is_empty()
        && extract_domain(url).is_some_and(|domain| domain == original_domain)
}
