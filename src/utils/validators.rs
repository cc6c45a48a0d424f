/// Restrict target URLs to http/https. The `url` validator on the request
/// struct already checks that the value parses as an absolute URL; this
/// rejects the remaining schemes (ftp, javascript, data, ...).
/// Scheme comparison is case-insensitive, as URL schemes are.
pub fn is_valid_http_url(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        }
        None => false,
    }
}
