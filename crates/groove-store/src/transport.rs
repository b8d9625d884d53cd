use std::io::{self, Read};

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the document store. Paths are relative to the
/// store root (`<db>`, `<db>/<id>`, `<db>/_design/<d>/_view/<v>`); query
/// parameter values are raw; percent-encoding is the transport's concern.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl StoreRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn put(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    fn new(method: Method, path: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_params<N, V>(mut self, params: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self.query.push((name.into(), value.into()));
        }
        self
    }
}

/// A response from the document store. The body is a live stream owned by
/// the response: reading it to the end consumes it, dropping it releases it.
/// Either must happen on every path, including error handling.
pub struct StoreResponse {
    pub status: u16,
    pub body: Box<dyn Read>,
}

impl StoreResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the body to the end, consuming the response.
    pub fn read_body(self) -> io::Result<Vec<u8>> {
        let mut body = self.body;
        let mut buf = Vec::new();
        body.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Request/response primitive for the document store. Implementations
/// deliver the request and hand back the status line and body stream;
/// they do not interpret statuses; a 404 is a successful execution.
pub trait Transport {
    fn execute(&self, request: StoreRequest) -> Result<StoreResponse, TransportError>;
}
