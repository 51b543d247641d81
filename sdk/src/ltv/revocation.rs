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

//! OCSP-first, CRL-fallback revocation evidence for one certificate.

use thiserror::Error;

use crate::{
    certificate::Certificate,
    crypto::{
        crl::{fetch_crl, CrlError},
        ocsp::{fetch_ocsp_response, OcspError},
    },
    http::HttpClient,
    settings,
};

/// Describes errors that can occur while collecting revocation data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RevocationError {
    /// Neither OCSP nor a CRL produced usable data.
    #[error("no revocation data for certificate {certificate}: {reason}")]
    Unavailable {
        /// Key of the certificate, see [`Certificate::key`].
        certificate: String,

        /// What each source reported.
        reason: String,
    },

    /// The OCSP request failed.
    #[error(transparent)]
    Ocsp(#[from] OcspError),

    /// The CRL download failed.
    #[error(transparent)]
    Crl(#[from] CrlError),
}

/// Revocation evidence for one certificate.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationData {
    /// A successful OCSP response, DER-encoded.
    pub ocsp_response: Option<Vec<u8>>,

    /// Certificates embedded in the OCSP response. A verifier needs them to
    /// check the response signature.
    pub ocsp_responder_certs: Vec<Vec<u8>>,

    /// A CRL, DER-encoded.
    pub crl: Option<Vec<u8>>,
}

impl RevocationData {
    /// `true` if no evidence was collected.
    pub fn is_empty(&self) -> bool {
        self.ocsp_response.is_none() && self.crl.is_none()
    }
}

#[derive(Clone)]
pub(crate) struct RevocationProvider {
    http: HttpClient,
    settings: settings::Revocation,
}

impl RevocationProvider {
    pub(crate) fn new(http: HttpClient, settings: &settings::Revocation) -> Self {
        Self {
            http,
            settings: settings.clone(),
        }
    }

    /// Collect revocation data for `cert`, issued by `issuer`.
    ///
    /// Self-signed certificates are never queried and yield empty data.
    pub(crate) async fn revocation_data(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
    ) -> Result<RevocationData, RevocationError> {
        if cert.is_self_signed() {
            return Ok(RevocationData::default());
        }

        let mut failures = Vec::new();

        if self.settings.prefer_ocsp {
            match self.ocsp(cert, issuer).await {
                Ok(data) => return Ok(data),
                Err(err) => failures.push(format!("OCSP: {err}")),
            }
        }

        if self.settings.fetch_crl {
            match fetch_crl(&self.http, cert).await {
                Ok(crl) => {
                    return Ok(RevocationData {
                        crl: Some(crl),
                        ..Default::default()
                    })
                }
                Err(err) => failures.push(format!("CRL: {err}")),
            }
        }

        if !self.settings.prefer_ocsp {
            match self.ocsp(cert, issuer).await {
                Ok(data) => return Ok(data),
                Err(err) => failures.push(format!("OCSP: {err}")),
            }
        }

        Err(RevocationError::Unavailable {
            certificate: cert.key(),
            reason: failures.join("; "),
        })
    }

    async fn ocsp(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
    ) -> Result<RevocationData, OcspError> {
        let response =
            fetch_ocsp_response(&self.http, cert, issuer, self.settings.ocsp_cert_id_hash).await?;

        Ok(RevocationData {
            ocsp_response: Some(response.ocsp_der),
            ocsp_responder_certs: response.ocsp_certs,
            crl: None,
        })
    }
}
