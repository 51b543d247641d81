// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! HTTP abstraction layer.
//!
//! The chain builder, revocation provider, time stamp client, and KMS client
//! all talk to the network through [`AsyncHttpResolver`] so that host
//! applications can plug in their own HTTP stack, add proxies or
//! authentication, or disable networking entirely.
//!
//! # When do outbound network requests occur?
//!
//! - Fetching issuer certificates named in an AIA `caIssuers` entry (GET)
//! - Fetching OCSP responses (POST) and CRLs (GET)
//! - Requesting RFC 3161 time stamps (POST)
//! - Signing through a remote KMS (POST)

use std::{io, sync::Arc, time::Duration};

use async_trait::async_trait;
use http::{header, Request, Response, StatusCode};

mod reqwest;

// Since we use `http::Request` and `http::Response` we also expose the `http` crate.
pub use http;

/// A resolver for non-blocking (async) HTTP requests.
#[async_trait]
pub trait AsyncHttpResolver: Send + Sync {
    /// Resolve a [`Request`] into a [`Response`] with a fully buffered body.
    ///
    /// [`Request`]: http::Request
    /// [`Response`]: http::Response
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResolverError>;
}

#[async_trait]
impl<T: AsyncHttpResolver + ?Sized> AsyncHttpResolver for Arc<T> {
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResolverError> {
        (**self).http_resolve_async(request).await
    }
}

/// Request extension carrying the largest response body, in bytes, the
/// caller will accept.
///
/// Every request made by this crate carries one. Resolvers that read the body
/// incrementally should give up with [`HttpResolverError::ResponseTooLarge`]
/// as soon as the limit is crossed instead of buffering the rest.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResponseLimit(pub usize);

/// A generic resolver for [`AsyncHttpResolver`].
///
/// Uses [`reqwest::Client`] when the `http_reqwest` feature is enabled and
/// otherwise refuses every request.
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
pub struct AsyncGenericResolver(async_resolver::Impl);

impl AsyncGenericResolver {
    /// Create a new [`AsyncGenericResolver`] with an auto-specified [`AsyncHttpResolver`].
    pub fn new() -> Self {
        Self(async_resolver::new())
    }
}

impl Default for AsyncGenericResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncHttpResolver for AsyncGenericResolver {
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResolverError> {
        self.0.http_resolve_async(request).await
    }
}

/// An error that occurs during async HTTP resolution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HttpResolverError {
    /// An error occured in the [`http`] crate.
    #[error(transparent)]
    Http(#[from] http::Error),

    /// An error occured during I/O.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The async HTTP resolver is not implemented.
    ///
    /// Note this often occurs when the `http_reqwest` feature is disabled.
    #[error("the async http resolver is not implemented")]
    AsyncHttpResolverNotImplemented,

    /// The server answered with a non-success status code.
    #[error("\"{uri}\" responded with HTTP status {status}")]
    Status {
        /// The requested URI.
        uri: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to \"{uri}\" timed out after {timeout:?}")]
    Timeout {
        /// The requested URI.
        uri: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The response body exceeded the configured size limit.
    #[error("response from \"{uri}\" exceeds {limit} bytes")]
    ResponseTooLarge {
        /// The requested URI.
        uri: String,
        /// The configured limit.
        limit: usize,
    },

    /// An error occured from the underlying HTTP resolver.
    #[error("an error occurred from the underlying http resolver: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Timeout-bounded access to an [`AsyncHttpResolver`], shared by every
/// network-facing component.
#[derive(Clone)]
pub(crate) struct HttpClient {
    resolver: Arc<dyn AsyncHttpResolver>,
    timeout: Duration,
    max_response_size: usize,
    user_agent: Option<String>,
}

impl HttpClient {
    pub(crate) fn new(
        resolver: Arc<dyn AsyncHttpResolver>,
        network: &crate::settings::Network,
    ) -> Self {
        Self {
            resolver,
            timeout: Duration::from_secs(network.timeout_secs),
            max_response_size: network.max_response_size,
            user_agent: network.user_agent.clone(),
        }
    }

    /// Send `request`, bounded by the configured timeout and response size.
    ///
    /// The size limit travels with the request as a [`ResponseLimit`]. It is
    /// checked again here for resolvers that ignore it.
    ///
    /// The status code is not checked; see [`HttpClient::get`] and
    /// [`HttpClient::post`] for that.
    pub(crate) async fn send(
        &self,
        mut request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResolverError> {
        let uri = request.uri().to_string();

        if let Some(user_agent) = &self.user_agent {
            if let Ok(value) = header::HeaderValue::from_str(user_agent) {
                request.headers_mut().insert(header::USER_AGENT, value);
            }
        }

        request
            .extensions_mut()
            .insert(ResponseLimit(self.max_response_size));

        log::debug!("{} {uri}", request.method());

        let response = tokio::time::timeout(
            self.timeout,
            self.resolver.http_resolve_async(request),
        )
        .await
        .map_err(|_| HttpResolverError::Timeout {
            uri: uri.clone(),
            timeout: self.timeout,
        })??;

        if response.body().len() > self.max_response_size {
            return Err(HttpResolverError::ResponseTooLarge {
                uri,
                limit: self.max_response_size,
            });
        }

        log::debug!(
            "{uri} answered {} ({} bytes)",
            response.status(),
            response.body().len()
        );

        Ok(response)
    }

    /// GET `url` and return the body of a successful response.
    pub(crate) async fn get(&self, url: &str, accept: &str) -> Result<Vec<u8>, HttpResolverError> {
        let request = Request::get(url)
            .header(header::ACCEPT, accept)
            .body(Vec::new())?;

        self.send_checked(request).await
    }

    /// POST `body` to `url` and return the body of a successful response.
    pub(crate) async fn post(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpResolverError> {
        let request = Request::post(url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::ACCEPT, accept)
            .body(body)?;

        self.send_checked(request).await
    }

    async fn send_checked(&self, request: Request<Vec<u8>>) -> Result<Vec<u8>, HttpResolverError> {
        let uri = request.uri().to_string();
        let response = self.send(request).await?;

        if response.status() != StatusCode::OK {
            return Err(HttpResolverError::Status {
                uri,
                status: response.status().as_u16(),
            });
        }

        Ok(response.into_body())
    }
}

#[cfg(feature = "http_reqwest")]
mod async_resolver {
    pub type Impl = reqwest::Client;

    pub fn new() -> Impl {
        reqwest::Client::new()
    }
}

#[cfg(not(feature = "http_reqwest"))]
mod async_resolver {
    use super::*;

    pub type Impl = AsyncNoopResolver;

    pub fn new() -> Impl {
        AsyncNoopResolver
    }

    pub struct AsyncNoopResolver;

    #[async_trait]
    impl AsyncHttpResolver for AsyncNoopResolver {
        async fn http_resolve_async(
            &self,
            _request: Request<Vec<u8>>,
        ) -> Result<Response<Vec<u8>>, HttpResolverError> {
            Err(HttpResolverError::AsyncHttpResolverNotImplemented)
        }
    }
}
