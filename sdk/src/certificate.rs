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

//! Parsed X.509 certificates.
//!
//! A [`Certificate`] keeps the original DER bytes next to the handful of
//! fields chain building and revocation checking need. Certificates are
//! immutable once parsed.

use std::fmt;

use thiserror::Error;
use x509_parser::{
    der_parser::{oid, Oid},
    extensions::{DistributionPointName, GeneralName, ParsedExtension},
    prelude::*,
};

use crate::crypto::hash::sha1;

const AD_CA_ISSUERS_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .2);
const AD_OCSP_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .1);

/// Describes errors that can occur when parsing a certificate.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    /// The bytes are not a DER-encoded X.509 certificate.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The PEM envelope did not contain a certificate.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),
}

/// An X.509 certificate with the fields used by chain building and
/// revocation checking.
#[derive(Clone, Eq, PartialEq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    serial: Vec<u8>,
    subject_public_key_info: Vec<u8>,
    subject_public_key: Vec<u8>,
    ca_issuer_urls: Vec<String>,
    ocsp_urls: Vec<String>,
    crl_urls: Vec<String>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// Trailing bytes after the certificate are rejected.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (rem, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::InvalidCertificate(e.to_string()))?;

        if !rem.is_empty() {
            return Err(CertificateError::InvalidCertificate(format!(
                "{} trailing bytes after certificate",
                rem.len()
            )));
        }

        let mut ca_issuer_urls = Vec::new();
        let mut ocsp_urls = Vec::new();
        let mut crl_urls = Vec::new();

        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    for ad in &aia.accessdescs {
                        if let GeneralName::URI(uri) = &ad.access_location {
                            if ad.access_method == AD_CA_ISSUERS_OID {
                                ca_issuer_urls.push(uri.to_string());
                            } else if ad.access_method == AD_OCSP_OID {
                                ocsp_urls.push(uri.to_string());
                            }
                        }
                    }
                }
                ParsedExtension::CRLDistributionPoints(points) => {
                    for point in &points.points {
                        if let Some(DistributionPointName::FullName(names)) =
                            &point.distribution_point
                        {
                            for name in names {
                                if let GeneralName::URI(uri) = name {
                                    crl_urls.push(uri.to_string());
                                }
                            }
                        }
                    }
                }
                _ => (),
            }
        }

        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().as_raw().to_vec(),
            issuer: cert.issuer().as_raw().to_vec(),
            serial: cert.raw_serial().to_vec(),
            subject_public_key_info: cert.public_key().raw.to_vec(),
            subject_public_key: cert.public_key().subject_public_key.data.to_vec(),
            ca_issuer_urls,
            ocsp_urls,
            crl_urls,
        })
    }

    /// Parse the first certificate in a PEM document.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        let parsed = ::pem::parse(pem).map_err(|e| CertificateError::InvalidPem(e.to_string()))?;

        if parsed.tag() != "CERTIFICATE" {
            return Err(CertificateError::InvalidPem(format!(
                "unexpected PEM tag {}",
                parsed.tag()
            )));
        }

        Self::from_der(parsed.contents())
    }

    /// Parse either DER or PEM.
    pub fn from_der_or_pem(data: &[u8]) -> Result<Self, CertificateError> {
        if data.starts_with(b"-----BEGIN") {
            Self::from_pem(data)
        } else {
            Self::from_der(data)
        }
    }

    /// The DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Identity and deduplication key: lowercase hex SHA-1 of the DER bytes.
    pub fn key(&self) -> String {
        certificate_key(&self.der)
    }

    /// DER encoding of the subject `Name`.
    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    /// DER encoding of the issuer `Name`.
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    /// Big-endian serial number bytes as they appear in the certificate.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// `(issuer, serial)`, which uniquely identifies a certificate issued by
    /// a well-behaved CA.
    pub fn issuer_and_serial(&self) -> (&[u8], &[u8]) {
        (&self.issuer, &self.serial)
    }

    /// DER encoding of the `SubjectPublicKeyInfo`.
    pub fn subject_public_key_info(&self) -> &[u8] {
        &self.subject_public_key_info
    }

    /// Contents of the `subjectPublicKey` BIT STRING.
    pub fn subject_public_key(&self) -> &[u8] {
        &self.subject_public_key
    }

    /// `true` if subject and issuer are byte-identical.
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    /// `true` if `self` names `other` as its issuer.
    pub fn is_issued_by(&self, other: &Certificate) -> bool {
        self.issuer == other.subject
    }

    /// AIA `caIssuers` URLs.
    pub fn ca_issuer_urls(&self) -> &[String] {
        &self.ca_issuer_urls
    }

    /// AIA OCSP responder URLs.
    pub fn ocsp_urls(&self) -> &[String] {
        &self.ocsp_urls
    }

    /// CRL distribution point URLs.
    pub fn crl_urls(&self) -> &[String] {
        &self.crl_urls
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("key", &self.key())
            .field("self_signed", &self.is_self_signed())
            .field("ca_issuer_urls", &self.ca_issuer_urls)
            .field("ocsp_urls", &self.ocsp_urls)
            .field("crl_urls", &self.crl_urls)
            .finish()
    }
}

/// Lowercase hex SHA-1 of `der`, the identity used to deduplicate
/// certificates.
pub fn certificate_key(der: &[u8]) -> String {
    hex::encode(sha1(der))
}
