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

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use rasn::prelude::*;
use rasn_pkix::{GeneralName, Time};

use super::{encode_signed_data, CmsError};
use crate::crypto::{
    asn1::{
        oids,
        rfc5035::{EssCertIdV2, IssuerSerial, SigningCertificateV2},
        rfc5652::{
            Attribute, EncapsulatedContentInfo, IssuerAndSerialNumber, SignedData, SignerIdentifier,
            SignerInfo,
        },
        rfc6211::CmsAlgorithmProtection,
    },
    ec_utils,
    hash::DigestAlgorithm,
    raw_signature::{signature_algorithm_identifier, KeyType, Signer},
};

/// Builds a detached CAdES-BES `SignedData` over a precomputed document
/// digest.
///
/// ```no_run
/// # use pades_ltv::{CmsBuilder, DigestAlgorithm, Signer};
/// # async fn sign(signer: &dyn Signer, digest: &[u8]) -> Result<Vec<u8>, pades_ltv::CmsError> {
/// let cms = CmsBuilder::new(signer, DigestAlgorithm::Sha256)
///     .sign_digest(digest)
///     .await?;
/// # Ok(cms)
/// # }
/// ```
pub struct CmsBuilder<'a> {
    signer: &'a dyn Signer,
    digest_algorithm: DigestAlgorithm,
    signing_time: Option<DateTime<Utc>>,
}

impl<'a> CmsBuilder<'a> {
    /// Sign with `signer`, using `digest_algorithm` for the signed
    /// attributes. The signing time defaults to now.
    pub fn new(signer: &'a dyn Signer, digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            signer,
            digest_algorithm,
            signing_time: Some(Utc::now()),
        }
    }

    /// Set the `signing-time` attribute, or leave it out with `None`.
    pub fn with_signing_time(mut self, signing_time: Option<DateTime<Utc>>) -> Self {
        self.signing_time = signing_time;
        self
    }

    /// Produce a DER `ContentInfo` whose `message-digest` is `digest`.
    ///
    /// `digest` must already be the hash of the signed byte ranges under
    /// this builder's digest algorithm.
    pub async fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, CmsError> {
        let signer_cert: rasn_pkix::Certificate = rasn::der::decode(self.signer.certificate())
            .map_err(|e| CmsError::Decoding(format!("signer certificate: {e}")))?;

        let signature_algorithm = signature_algorithm_identifier(
            self.signer.signature_algorithm(),
            self.digest_algorithm,
        )?;

        let signed_attrs = self.signed_attributes(digest, &signer_cert, &signature_algorithm)?;
        let to_be_signed =
            rasn::der::encode(&signed_attrs).map_err(|e| CmsError::Encoding(e.to_string()))?;

        let mut signature = self
            .signer
            .sign(&to_be_signed, self.digest_algorithm)
            .await?;

        if self.signer.key_type() == KeyType::Ec {
            signature = ec_utils::normalize_ecdsa_signature(&signature)?;
        }

        let signer_info = SignerInfo {
            version: 1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: signer_cert.tbs_certificate.issuer.clone(),
                serial_number: signer_cert.tbs_certificate.serial_number.clone(),
            }),
            digest_algorithm: self.digest_algorithm.algorithm_identifier(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm,
            signature: OctetString::from(signature),
            unsigned_attrs: None,
        };

        let mut digest_algorithms = SetOf::new();
        digest_algorithms.insert(self.digest_algorithm.algorithm_identifier());

        let mut certificates = SetOf::new();
        certificates.insert(Any::new(self.signer.certificate().to_vec()));
        for cert in self.signer.certificate_chain() {
            certificates.insert(Any::new(cert.clone()));
        }

        let mut signer_infos = SetOf::new();
        signer_infos.insert(signer_info);

        let signed_data = SignedData {
            version: 1,
            digest_algorithms,
            encap_content_info: EncapsulatedContentInfo {
                content_type: ObjectIdentifier::from(oids::ID_DATA),
                content: None,
            },
            certificates: Some(certificates),
            crls: None,
            signer_infos,
        };

        let cms = encode_signed_data(&signed_data)?;

        log::debug!(
            "CMS signed with {} / {} ({} bytes)",
            self.signer.signature_algorithm(),
            self.digest_algorithm,
            cms.len()
        );

        Ok(cms)
    }

    fn signed_attributes(
        &self,
        digest: &[u8],
        signer_cert: &rasn_pkix::Certificate,
        signature_algorithm: &rasn_pkix::AlgorithmIdentifier,
    ) -> Result<SetOf<Attribute>, CmsError> {
        let encode = |e: rasn::error::EncodeError| CmsError::Encoding(e.to_string());

        let mut attrs = SetOf::new();

        attrs.insert(Attribute::new(
            oids::CONTENT_TYPE,
            rasn::der::encode(&ObjectIdentifier::from(oids::ID_DATA)).map_err(encode)?,
        ));

        if let Some(signing_time) = self.signing_time {
            attrs.insert(Attribute::new(
                oids::SIGNING_TIME,
                rasn::der::encode(&signing_time_value(signing_time)).map_err(encode)?,
            ));
        }

        let protection = CmsAlgorithmProtection {
            digest_algorithm: self.digest_algorithm.algorithm_identifier(),
            signature_algorithm: Some(signature_algorithm.clone()),
            mac_algorithm: None,
        };
        attrs.insert(Attribute::new(
            oids::CMS_ALGORITHM_PROTECTION,
            rasn::der::encode(&protection).map_err(encode)?,
        ));

        attrs.insert(Attribute::new(
            oids::MESSAGE_DIGEST,
            rasn::der::encode(&OctetString::from(digest.to_vec())).map_err(encode)?,
        ));

        let ess_cert_id = EssCertIdV2 {
            hash_algorithm: (self.digest_algorithm != DigestAlgorithm::Sha256)
                .then(|| self.digest_algorithm.algorithm_identifier()),
            cert_hash: OctetString::from(self.digest_algorithm.digest(self.signer.certificate())),
            issuer_serial: Some(IssuerSerial {
                issuer: vec![GeneralName::DirectoryName(
                    signer_cert.tbs_certificate.issuer.clone(),
                )],
                serial_number: signer_cert.tbs_certificate.serial_number.clone(),
            }),
        };
        let signing_certificate = SigningCertificateV2 {
            certs: vec![ess_cert_id],
            policies: None,
        };
        attrs.insert(Attribute::new(
            oids::SIGNING_CERTIFICATE_V2,
            rasn::der::encode(&signing_certificate).map_err(encode)?,
        ));

        Ok(attrs)
    }
}

// RFC 5652 section 11.3: UTCTime through 2049, GeneralizedTime after.
fn signing_time_value(time: DateTime<Utc>) -> Time {
    let time = time.with_nanosecond(0).unwrap_or(time);

    if time.year() < 2050 {
        Time::Utc(time)
    } else {
        Time::General(DateTime::<FixedOffset>::from(time))
    }
}
