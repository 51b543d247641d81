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

//! Certificate chain completion through Authority Information Access.

use std::collections::HashSet;

use thiserror::Error;

use crate::{
    certificate::Certificate,
    cms,
    http::{HttpClient, HttpResolverError},
};

const CERT_CONTENT_TYPE: &str = "application/pkix-cert";

/// Describes errors that can occur while completing a certificate chain.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateChainError {
    /// The issuer certificate could not be downloaded.
    #[error("unable to fetch issuer certificate from {url}: {source}")]
    Fetch {
        /// The CA-Issuers URL.
        url: String,

        /// The underlying network error.
        #[source]
        source: HttpResolverError,
    },

    /// The downloaded bytes are not a certificate.
    #[error("unable to parse issuer certificate from {url}: {reason}")]
    Parse {
        /// The CA-Issuers URL.
        url: String,

        /// Why parsing failed.
        reason: String,
    },
}

/// A certificate chain ordered from the end-entity certificate toward the
/// root.
#[derive(Clone, Debug)]
pub struct CertificateChain {
    /// The certificates, end-entity first.
    pub certificates: Vec<Certificate>,

    /// `true` if the chain ends in a self-signed certificate.
    pub complete: bool,
}

/// Walks CA-Issuers links until a self-signed certificate is reached.
#[derive(Clone)]
pub(crate) struct ChainBuilder {
    http: HttpClient,
    max_length: usize,
}

impl ChainBuilder {
    pub(crate) fn new(http: HttpClient, max_length: usize) -> Self {
        Self { http, max_length }
    }

    /// Complete the chain of `cert`.
    ///
    /// `partial` holds certificates already known to follow `cert`, issuer
    /// first. Building resumes from its tail. Running out of AIA links, a
    /// repeated certificate, or the length cap all stop the walk with
    /// `complete == false`; only fetch and parse failures are errors.
    pub(crate) async fn complete_chain(
        &self,
        cert: &Certificate,
        partial: &[Certificate],
    ) -> Result<CertificateChain, CertificateChainError> {
        let mut certificates = vec![cert.clone()];
        let mut seen = HashSet::new();
        seen.insert(identity(cert));

        for c in partial {
            if seen.insert(identity(c)) {
                certificates.push(c.clone());
            }
        }

        while certificates.len() < self.max_length {
            let Some(current) = certificates.last() else {
                break;
            };

            if current.is_self_signed() {
                break;
            }

            let Some(url) = current.ca_issuer_urls().first().cloned() else {
                log::debug!("certificate {} has no CA-Issuers URL", current.key());
                break;
            };

            let issuer = self.fetch_issuer(&url, current).await?;

            if !seen.insert(identity(&issuer)) {
                log::debug!("{url} returned a certificate already in the chain");
                break;
            }

            certificates.push(issuer);
        }

        let complete = certificates
            .last()
            .map(Certificate::is_self_signed)
            .unwrap_or_default();

        Ok(CertificateChain {
            certificates,
            complete,
        })
    }

    async fn fetch_issuer(
        &self,
        url: &str,
        subject: &Certificate,
    ) -> Result<Certificate, CertificateChainError> {
        let body = self
            .http
            .get(url, CERT_CONTENT_TYPE)
            .await
            .map_err(|source| CertificateChainError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let candidates =
            parse_certificates(&body).map_err(|reason| CertificateChainError::Parse {
                url: url.to_string(),
                reason,
            })?;

        let position = candidates
            .iter()
            .position(|c| subject.is_issued_by(c))
            .unwrap_or_default();

        candidates
            .into_iter()
            .nth(position)
            .ok_or_else(|| CertificateChainError::Parse {
                url: url.to_string(),
                reason: "no certificates in response".to_string(),
            })
    }
}

fn identity(cert: &Certificate) -> (Vec<u8>, Vec<u8>) {
    let (issuer, serial) = cert.issuer_and_serial();
    (issuer.to_vec(), serial.to_vec())
}

/// Certificates from a CA-Issuers response: DER, PEM, or a certs-only
/// PKCS#7 bundle.
pub(crate) fn parse_certificates(body: &[u8]) -> Result<Vec<Certificate>, String> {
    if body.starts_with(b"-----BEGIN") {
        let pems = pem::parse_many(body).map_err(|e| e.to_string())?;
        return pems
            .iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .map(|p| Certificate::from_der(p.contents()).map_err(|e| e.to_string()))
            .collect();
    }

    match Certificate::from_der(body) {
        Ok(cert) => Ok(vec![cert]),
        Err(cert_err) => match cms::embedded_certificates(body) {
            Ok(ders) => ders
                .iter()
                .map(|der| Certificate::from_der(der).map_err(|e| e.to_string()))
                .collect(),
            Err(_) => Err(cert_err.to_string()),
        },
    }
}

/// Order `others` so each certificate is followed by its issuer, starting
/// with the issuer of `leaf`. Certificates that do not link up are left out.
pub(crate) fn order_chain(leaf: &Certificate, others: &[Certificate]) -> Vec<Certificate> {
    let mut ordered: Vec<Certificate> = Vec::new();
    let mut current = leaf.clone();

    while !current.is_self_signed() {
        let next = others
            .iter()
            .find(|c| current.is_issued_by(c) && **c != current && !ordered.contains(c));

        match next {
            Some(next) => {
                ordered.push(next.clone());
                current = next.clone();
            }
            None => break,
        }
    }

    ordered
}
