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

//! Certificate revocation list retrieval.

use thiserror::Error;
use x509_parser::prelude::{CertificateRevocationList, FromDer};

use crate::{certificate::Certificate, http::HttpClient, http::HttpResolverError};

const CRL_CONTENT_TYPE: &str = "application/pkix-crl";

/// Describes errors that can occur while fetching a CRL.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CrlError {
    /// The certificate names no CRL distribution point.
    #[error("certificate has no CRL distribution point")]
    NoDistributionPoint,

    /// The downloaded bytes are not a CRL.
    #[error("invalid CRL from {url}: {reason}")]
    InvalidCrl {
        /// Where the CRL came from.
        url: String,

        /// Why it was rejected.
        reason: String,
    },

    /// The request did not complete.
    #[error(transparent)]
    Http(#[from] HttpResolverError),
}

/// Normalize a downloaded CRL to DER, accepting a PEM `X509 CRL` block.
pub(crate) fn crl_to_der(url: &str, body: Vec<u8>) -> Result<Vec<u8>, CrlError> {
    let invalid = |reason: String| CrlError::InvalidCrl {
        url: url.to_string(),
        reason,
    };

    let der = if body.starts_with(b"-----BEGIN") {
        pem::parse(&body)
            .map_err(|e| invalid(e.to_string()))?
            .into_contents()
    } else {
        body
    };

    match CertificateRevocationList::from_der(&der) {
        Ok((rem, _)) if rem.is_empty() => Ok(der),
        Ok(_) => Err(invalid("trailing data after CRL".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Fetch the first CRL that downloads and parses from `cert`'s distribution
/// points.
pub(crate) async fn fetch_crl(http: &HttpClient, cert: &Certificate) -> Result<Vec<u8>, CrlError> {
    let mut last_error = CrlError::NoDistributionPoint;

    for url in cert.crl_urls() {
        let result = http
            .get(url, CRL_CONTENT_TYPE)
            .await
            .map_err(CrlError::from)
            .and_then(|body| crl_to_der(url, body));

        match result {
            Ok(crl) => {
                log::debug!("CRL from {url} ({} bytes)", crl.len());
                return Ok(crl);
            }
            Err(err) => {
                log::debug!("CRL distribution point {url} unusable: {err}");
                last_error = err;
            }
        }
    }

    Err(last_error)
}
