//! Platform default header construction.

use reqwest::header::{HeaderMap, HeaderValue};

/// Default headers every Cove request carries.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

    headers.insert(
        reqwest::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    headers.insert(
        reqwest::header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );

    headers.insert(
        reqwest::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_match_platform_contract() {
        let headers = default_headers();
        assert_eq!(headers.get(reqwest::header::ACCEPT).unwrap(), "*/*");
        assert_eq!(
            headers.get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            headers.get(reqwest::header::ACCEPT_ENCODING).unwrap(),
            "gzip, deflate"
        );
        assert_eq!(headers.get(reqwest::header::CONNECTION).unwrap(), "keep-alive");
    }
}
