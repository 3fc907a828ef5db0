//! Approximate request/response sizes
//!
//! The estimate is body length plus header key/value lengths, with two
//! bytes of framing per header line and two for the body separator. It is
//! not the exact wire size.

use axum::body::HttpBody;
use axum::http::{HeaderMap, Request, Response};

/// Estimate the size of a message from its body length and header pairs.
pub fn estimate_size<K, V>(body_len: usize, headers: impl IntoIterator<Item = (K, V)>) -> usize
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    headers
        .into_iter()
        .fold(body_len + 2, |size, (key, value)| {
            size + key.as_ref().len() + value.as_ref().len() + 2
        })
}

/// Estimate over an `http` header map.
pub fn estimate_with_headers(body_len: usize, headers: &HeaderMap) -> usize {
    estimate_size(
        body_len,
        headers
            .iter()
            .map(|(name, value)| (name.as_str().as_bytes(), value.as_bytes())),
    )
}

/// Approximate size of a request, without reading its body.
pub fn request_size<B: HttpBody>(request: &Request<B>) -> usize {
    estimate_with_headers(body_len(request.body()), request.headers())
}

/// Approximate size of a response, without reading its body.
pub fn response_size<B: HttpBody>(response: &Response<B>) -> usize {
    estimate_with_headers(body_len(response.body()), response.headers())
}

/// Body length from its size hint: the upper bound when known, the lower
/// bound for open-ended streams.
fn body_len<B: HttpBody>(body: &B) -> usize {
    let hint = body.size_hint();
    let len = hint.upper().unwrap_or_else(|| hint.lower());
    usize::try_from(len).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;

    #[test]
    fn test_estimate_empty() {
        let headers: Vec<(&str, &str)> = Vec::new();
        assert_eq!(estimate_size(0, headers), 2);
    }

    #[test]
    fn test_estimate_formula() {
        let headers = [("host", "example.com"), ("accept", "*/*")];
        // 5 + 2 + (4 + 11 + 2) + (6 + 3 + 2)
        assert_eq!(estimate_size(5, headers), 35);
        assert_eq!(estimate_size(5, headers), estimate_size(5, headers));
    }

    #[test]
    fn test_request_size() {
        let request = Request::builder()
            .uri("/upload")
            .header(header::HOST, "example.com")
            .body(Body::from("hello"))
            .unwrap();

        assert_eq!(request_size(&request), 5 + 2 + 4 + 11 + 2);
    }

    #[test]
    fn test_response_size() {
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("ok"))
            .unwrap();

        assert_eq!(response_size(&response), 2 + 2 + 12 + 10 + 2);
    }

    #[test]
    fn test_empty_body_counts_headers_only() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(request_size(&request), 2);
    }
}
