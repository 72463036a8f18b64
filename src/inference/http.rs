//! HTTP transport.
//!
//! `HttpClient` is the network capability the inference client talks
//! through. `UreqHttpClient` is the blocking production transport; every
//! status code, 2xx or not, comes back as an `HttpResponse` so the caller
//! decides what counts as failure. Only transport faults are `Err`.

use anyhow::{Context, Result};
use std::io::Read;
use std::time::Duration;

/// Largest response body read from the backend.
const MAX_RESPONSE_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            content_type: Some(content_type.into()),
            body,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

pub struct UreqHttpClient {
    agent: ureq::Agent,
}

impl UreqHttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqHttpClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        if let Some(content_type) = request.content_type.as_deref() {
            call = call.set("Content-Type", content_type);
        }
        let result = match request.method {
            Method::Get => call.call(),
            Method::Post => call.send_bytes(&request.body),
        };
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(anyhow::Error::new(transport).context(format!(
                    "{} {}",
                    request.method.as_str(),
                    request.url
                )));
            }
        };
        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut body)
            .with_context(|| format!("read response body from {}", request.url))?;
        Ok(HttpResponse { status, body })
    }
}
