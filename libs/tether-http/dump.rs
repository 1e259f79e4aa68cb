//! Wire-format renderings of requests and responses for logging

use reqwest::header::HeaderMap;
use reqwest::{Request, Response};
use std::fmt::Write as _;

/// What is known about a response once its status line and headers arrived
///
/// The body is only filled in when the client consumed it itself (rejected
/// responses, the default success hook).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSummary {
    pub status: u16,
    pub reason: Option<String>,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ResponseSummary {
    pub fn from_response(response: &Response) -> Self {
        Self {
            status: response.status().as_u16(),
            reason: response.status().canonical_reason().map(str::to_string),
            version: format!("{:?}", response.version()),
            headers: header_pairs(response.headers()),
            body: None,
        }
    }

    /// Render as `HTTP/1.1 200 OK`, headers, blank line, body
    pub fn dump(&self) -> String {
        let mut out = format!("{} {}", self.version, self.status);
        if let Some(reason) = &self.reason {
            let _ = write!(out, " {}", reason);
        }
        out.push_str("\r\n");
        write_headers(&mut out, &self.headers);
        if let Some(body) = &self.body {
            out.push_str(body);
        }
        out
    }
}

/// Render a request as it will go over the wire
pub fn dump_request(request: &Request) -> String {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        let _ = write!(target, "?{}", query);
    }

    let mut out = format!("{} {} {:?}\r\n", request.method(), target, request.version());
    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {}:{}\r\n", host, port);
            }
            None => {
                let _ = write!(out, "Host: {}\r\n", host);
            }
        }
    }
    write_headers(&mut out, &header_pairs(request.headers()));

    if let Some(bytes) = request.body().and_then(|body| body.as_bytes()) {
        out.push_str(&String::from_utf8_lossy(bytes));
    }
    out
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn write_headers(out: &mut String, headers: &[(String, String)]) {
    for (name, value) in headers {
        let _ = write!(out, "{}: {}\r\n", name, value);
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn request_dump_has_request_line_host_and_body() {
        let client = reqwest::Client::new();
        let request = client
            .request(Method::POST, "http://localhost:8080/v1/order?symbol=btcusdt")
            .header("x-api-key", "k")
            .body(r#"{"amount":1}"#)
            .build()
            .unwrap();

        let dump = dump_request(&request);
        assert!(dump.starts_with("POST /v1/order?symbol=btcusdt HTTP/1.1\r\nHost: localhost:8080\r\n"));
        assert!(dump.contains("x-api-key: k\r\n"));
        assert!(dump.ends_with("\r\n\r\n{\"amount\":1}"));
    }

    #[test]
    fn response_dump_includes_reason_and_body() {
        let summary = ResponseSummary {
            status: 404,
            reason: Some("Not Found".into()),
            version: "HTTP/1.1".into(),
            headers: vec![("content-length".into(), "7".into())],
            body: Some("missing".into()),
        };
        assert_eq!(
            summary.dump(),
            "HTTP/1.1 404 Not Found\r\ncontent-length: 7\r\n\r\nmissing"
        );
    }
}
