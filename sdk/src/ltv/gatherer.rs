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

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::{
    chain::{order_chain, ChainBuilder},
    revocation::{RevocationData, RevocationProvider},
};
use crate::{
    certificate::Certificate,
    cms::{self, CmsError},
    http::{AsyncHttpResolver, HttpClient},
    settings::Settings,
};

/// Why part of the validation data could not be gathered.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum LtvWarningCode {
    /// The signer's chain does not reach a self-signed root.
    ChainIncomplete,

    /// A time stamp authority's chain does not reach a self-signed root.
    TsaChainIncomplete,

    /// The signing certificate of an embedded time stamp could not be found.
    TsaCertExtractionFailed,

    /// No OCSP response or CRL could be obtained for a certificate.
    RevocationUnavailable,

    /// The CMS embeds no certificates.
    SignerCertificateMissing,
}

impl fmt::Display for LtvWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChainIncomplete => "CHAIN_INCOMPLETE",
            Self::TsaChainIncomplete => "TSA_CHAIN_INCOMPLETE",
            Self::TsaCertExtractionFailed => "TSA_CERT_EXTRACTION_FAILED",
            Self::RevocationUnavailable => "REVOCATION_UNAVAILABLE",
            Self::SignerCertificateMissing => "SIGNER_CERTIFICATE_MISSING",
        })
    }
}

/// A recoverable problem met while gathering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LtvWarning {
    /// What went wrong.
    pub code: LtvWarningCode,

    /// Details for humans.
    pub message: String,
}

impl fmt::Display for LtvWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Validation data for one CMS signature or time stamp token.
#[derive(Clone, Debug)]
pub struct LtvData {
    /// The CMS exactly as passed in, zero padding included.
    pub cms_bytes: Vec<u8>,

    /// Every certificate needed to validate the signature, its time stamps
    /// and their OCSP responses, deduplicated.
    pub certificates: Vec<Vec<u8>>,

    /// DER OCSP responses.
    pub ocsp_responses: Vec<Vec<u8>>,

    /// DER CRLs.
    pub crls: Vec<Vec<u8>>,

    /// RFC 3161 tokens found in the unsigned attributes.
    pub embedded_timestamps: Vec<Vec<u8>>,

    /// When gathering finished.
    pub gathered_at: DateTime<Utc>,

    /// Problems that left the data partial.
    pub warnings: Vec<LtvWarning>,
}

impl LtvData {
    /// `true` if a warning with `code` was recorded.
    pub fn has_warning(&self, code: LtvWarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

type CachedRevocation = Result<RevocationData, String>;

/// Collects chains, revocation data and time stamps for CMS signatures.
///
/// Revocation lookups are cached per certificate for the life of the
/// gatherer. Use a fresh gatherer for each document so answers never leak
/// between unrelated signing operations.
pub struct LtvGatherer {
    chain_builder: ChainBuilder,
    revocation: RevocationProvider,
    cache: Mutex<HashMap<String, CachedRevocation>>,
}

impl LtvGatherer {
    /// Create a gatherer that fetches through `resolver`.
    pub fn new(resolver: Arc<dyn AsyncHttpResolver>, settings: &Settings) -> Self {
        let http = HttpClient::new(resolver, &settings.network);

        Self {
            chain_builder: ChainBuilder::new(http.clone(), settings.chain.max_length),
            revocation: RevocationProvider::new(http, &settings.revocation),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Gather validation data for `cms`, a signature or a time stamp token.
    ///
    /// Only an unreadable CMS is an error. Everything that can be fetched
    /// is returned, with a warning for each part that could not.
    pub async fn gather(&self, cms: &[u8]) -> Result<LtvData, CmsError> {
        let embedded = cms::embedded_certificates(cms)?;
        let embedded_timestamps = cms::embedded_time_stamps(cms)?;

        let mut data = LtvData {
            cms_bytes: cms.to_vec(),
            certificates: Vec::new(),
            ocsp_responses: Vec::new(),
            crls: Vec::new(),
            embedded_timestamps: embedded_timestamps.clone(),
            gathered_at: Utc::now(),
            warnings: Vec::new(),
        };

        let signer_der = match cms::signer_certificate(cms) {
            Ok(Some(der)) => der,
            Ok(None) => {
                warn(
                    &mut data,
                    LtvWarningCode::SignerCertificateMissing,
                    "CMS embeds no certificates".to_string(),
                );
                return Ok(data);
            }
            Err(CmsError::NoSignerInfo) => {
                warn(
                    &mut data,
                    LtvWarningCode::SignerCertificateMissing,
                    "CMS has no SignerInfo".to_string(),
                );
                return Ok(data);
            }
            Err(e) => return Err(e),
        };

        let embedded_certs: Vec<Certificate> = embedded
            .iter()
            .filter_map(|der| Certificate::from_der(der).ok())
            .collect();

        let mut chains = Vec::new();

        match Certificate::from_der(&signer_der) {
            Ok(signer) => {
                let chain = self
                    .resolve_chain(
                        &signer,
                        &embedded_certs,
                        LtvWarningCode::ChainIncomplete,
                        &mut data,
                    )
                    .await;
                chains.push(chain);
            }
            Err(err) => warn(
                &mut data,
                LtvWarningCode::SignerCertificateMissing,
                format!("signer certificate is unreadable: {err}"),
            ),
        }

        for token in &embedded_timestamps {
            let tsa_cert = cms::signer_certificate(token)
                .map_err(|e| e.to_string())
                .and_then(|der| der.ok_or_else(|| "token embeds no certificates".to_string()))
                .and_then(|der| Certificate::from_der(&der).map_err(|e| e.to_string()));

            let tsa_cert = match tsa_cert {
                Ok(cert) => cert,
                Err(reason) => {
                    warn(&mut data, LtvWarningCode::TsaCertExtractionFailed, reason);
                    continue;
                }
            };

            let token_certs: Vec<Certificate> = cms::embedded_certificates(token)
                .unwrap_or_default()
                .iter()
                .filter_map(|der| Certificate::from_der(der).ok())
                .collect();

            let chain = self
                .resolve_chain(
                    &tsa_cert,
                    &token_certs,
                    LtvWarningCode::TsaChainIncomplete,
                    &mut data,
                )
                .await;
            chains.push(chain);
        }

        // Every certificate that needs revocation data, with its issuer.
        let known: Vec<Certificate> = chains.iter().flatten().cloned().collect();
        let mut queried = HashSet::new();
        let mut pairs = Vec::new();

        for cert in &known {
            if cert.is_self_signed() || !queried.insert(cert.key()) {
                continue;
            }

            match known.iter().find(|c| cert.is_issued_by(c) && *c != cert) {
                Some(issuer) => pairs.push((cert.clone(), issuer.clone())),
                None => warn(
                    &mut data,
                    LtvWarningCode::RevocationUnavailable,
                    format!("issuer of certificate {} is unknown", cert.key()),
                ),
            }
        }

        let results = join_all(
            pairs
                .iter()
                .map(|(cert, issuer)| self.cached_revocation(cert, issuer)),
        )
        .await;

        let mut certificates = Vec::new();
        for cert in &known {
            certificates.push(cert.der().to_vec());
        }

        for ((cert, _), result) in pairs.iter().zip(results) {
            match result {
                Ok(revocation) => {
                    data.ocsp_responses.extend(revocation.ocsp_response);
                    data.crls.extend(revocation.crl);
                    certificates.extend(revocation.ocsp_responder_certs);
                }
                Err(reason) => warn(
                    &mut data,
                    LtvWarningCode::RevocationUnavailable,
                    format!("certificate {}: {reason}", cert.key()),
                ),
            }
        }

        data.certificates = dedup(certificates);
        data.ocsp_responses = dedup(data.ocsp_responses);
        data.crls = dedup(data.crls);
        data.gathered_at = Utc::now();

        log::debug!(
            "gathered {} certificates, {} OCSP responses, {} CRLs with {} warnings",
            data.certificates.len(),
            data.ocsp_responses.len(),
            data.crls.len(),
            data.warnings.len()
        );

        Ok(data)
    }

    async fn resolve_chain(
        &self,
        cert: &Certificate,
        embedded: &[Certificate],
        code: LtvWarningCode,
        data: &mut LtvData,
    ) -> Vec<Certificate> {
        let partial = order_chain(cert, embedded);

        match self.chain_builder.complete_chain(cert, &partial).await {
            Ok(chain) => {
                if !chain.complete {
                    warn(
                        data,
                        code,
                        format!("chain of certificate {} does not reach a root", cert.key()),
                    );
                }
                chain.certificates
            }
            Err(err) => {
                warn(data, code, err.to_string());
                std::iter::once(cert.clone()).chain(partial).collect()
            }
        }
    }

    async fn cached_revocation(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
    ) -> CachedRevocation {
        let key = cert.key();

        if let Some(hit) = self.lock_cache().get(&key) {
            log::debug!("revocation cache hit for {key}");
            return hit.clone();
        }

        let result = self
            .revocation
            .revocation_data(cert, issuer)
            .await
            .map_err(|e| e.to_string());

        self.lock_cache().insert(key, result.clone());
        result
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedRevocation>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn warn(data: &mut LtvData, code: LtvWarningCode, message: String) {
    let warning = LtvWarning { code, message };
    log::warn!("{warning}");
    data.warnings.push(warning);
}

fn dedup(items: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(crate::crypto::hash::sha1(item)))
        .collect()
}
