//! Response planning: status line, headers, and the byte interval to send.
//!
//! Pure functions of the resolved location and the parsed range. The header
//! order is fixed: `Content-Type`, `Accept-Ranges`, `Content-Length`, then
//! `Content-Range` when present.

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

use cs_core::{ByteRange, MediaLocation};

/// Everything needed to answer a media request, decided before any byte of
/// the body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    range: Option<ByteRange>,
}

impl ResponseDescriptor {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Look up a planned header value by name.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.to_str().ok())
    }

    /// Bytes the transport must send. `None` means an empty body.
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Attach a body and build the HTTP response.
    pub fn into_response(self, body: Body) -> Response {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        response
    }
}

/// Plan a 200 (no range) or 206 (satisfiable range) response.
pub fn plan(location: &MediaLocation, range: Option<ByteRange>) -> ResponseDescriptor {
    let total = location.size();
    let mut headers = vec![
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(location.content_type()),
        ),
        (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
    ];

    match range {
        None => {
            headers.push((header::CONTENT_LENGTH, HeaderValue::from(total)));
            ResponseDescriptor {
                status: StatusCode::OK,
                headers,
                range: ByteRange::full(total),
            }
        }
        Some(r) => {
            headers.push((header::CONTENT_LENGTH, HeaderValue::from(r.len())));
            headers.push((header::CONTENT_RANGE, numeric_value(r.content_range())));
            ResponseDescriptor {
                status: StatusCode::PARTIAL_CONTENT,
                headers,
                range: Some(r),
            }
        }
    }
}

/// Plan a 416 with `Content-Range: bytes */{total}` and an empty body.
pub fn plan_unsatisfiable(location: &MediaLocation) -> ResponseDescriptor {
    ResponseDescriptor {
        status: StatusCode::RANGE_NOT_SATISFIABLE,
        headers: vec![
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(location.content_type()),
            ),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
            (header::CONTENT_LENGTH, HeaderValue::from(0u64)),
            (
                header::CONTENT_RANGE,
                numeric_value(format!("bytes */{}", location.size())),
            ),
        ],
        range: None,
    }
}

// Built only from digits, spaces, '-', '/' and '*', which are always valid.
fn numeric_value(s: String) -> HeaderValue {
    HeaderValue::try_from(s).unwrap_or_else(|_| HeaderValue::from_static("bytes */0"))
}
