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

//! Tools for requesting and reading OCSP responses ([RFC 6960]).
//!
//! Only the response envelope is inspected. A response whose top-level
//! status is anything but `successful` is an error, never an implicit
//! "not revoked".
//!
//! [RFC 6960]: https://www.rfc-editor.org/rfc/rfc6960

mod fetch;

pub(crate) use fetch::fetch_ocsp_response;
use rasn::prelude::*;
use rasn_ocsp::{BasicOcspResponse, CertStatus, OcspResponseStatus};
use thiserror::Error;

use crate::{
    certificate::Certificate,
    crypto::{asn1::oids, hash::DigestAlgorithm},
    http::HttpResolverError,
};

/// OcspResponse - the DER-encoded response of a responder together with the
/// certificates it embedded to let a verifier check the response signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspResponse {
    /// Original OCSP DER response.
    pub ocsp_der: Vec<u8>,

    /// Certificates embedded in the basic response, DER-encoded.
    pub ocsp_certs: Vec<Vec<u8>>,
}

/// Describes errors that can occur while requesting or reading an OCSP
/// response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OcspError {
    /// The certificate names no OCSP responder.
    #[error("certificate has no OCSP responder")]
    NoResponder,

    /// A certificate could not be decoded.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The request could not be encoded.
    #[error("unable to encode OCSP request: {0}")]
    Encoding(String),

    /// The response could not be decoded or does not cover the certificate.
    #[error("invalid OCSP response: {0}")]
    InvalidResponse(String),

    /// The responder answered with a non-successful status.
    #[error("OCSP responder status {0}")]
    Unsuccessful(String),

    /// The request did not complete.
    #[error(transparent)]
    Http(#[from] HttpResolverError),
}

// Create OCSP CertId for `cert` as issued by `issuer`.
pub(crate) fn make_ocsp_cert_id(
    cert: &Certificate,
    issuer: &Certificate,
    hash: DigestAlgorithm,
) -> Result<rasn_ocsp::CertId, OcspError> {
    let subject: rasn_pkix::Certificate = rasn::der::decode(cert.der())
        .map_err(|e| OcspError::InvalidCertificate(e.to_string()))?;

    let issuer_name_hash = hash.digest(issuer.subject());
    let issuer_key_hash = hash.digest(issuer.subject_public_key());

    // Many OCSP responders expect NULL parameters rather than none.
    let null = rasn::der::encode(&()).map_err(|e| OcspError::Encoding(e.to_string()))?;
    let hash_algorithm = rasn_pkix::AlgorithmIdentifier {
        algorithm: ObjectIdentifier::from(hash.oid()),
        parameters: Some(Any::new(null)),
    };

    Ok(rasn_ocsp::CertId {
        hash_algorithm,
        issuer_name_hash: OctetString::from(issuer_name_hash),
        issuer_key_hash: OctetString::from(issuer_key_hash),
        serial_number: subject.tbs_certificate.serial_number,
    })
}

/// DER-encode a single-certificate, unsigned OCSP request.
pub(crate) fn build_ocsp_request(cert_id: rasn_ocsp::CertId) -> Result<Vec<u8>, OcspError> {
    let tbs_request = rasn_ocsp::TbsRequest {
        version: rasn_ocsp::Version::from(0u8),
        requestor_name: None,
        request_list: vec![rasn_ocsp::Request {
            req_cert: cert_id,
            single_request_extensions: None,
        }],
        request_extensions: None,
    };

    let request = rasn_ocsp::OcspRequest {
        tbs_request,
        optional_signature: None,
    };

    rasn::der::encode(&request).map_err(|e| OcspError::Encoding(e.to_string()))
}

impl OcspResponse {
    /// Read an OCSP response in DER format.
    ///
    /// The response must have status `successful`, carry a basic response,
    /// and contain a single response for `cert_id`'s serial number.
    pub(crate) fn from_der(der: &[u8], cert_id: &rasn_ocsp::CertId) -> Result<Self, OcspError> {
        let invalid = |e: &dyn std::fmt::Display| OcspError::InvalidResponse(e.to_string());

        let ocsp_response: rasn_ocsp::OcspResponse =
            rasn::der::decode(der).map_err(|e| invalid(&e))?;

        if ocsp_response.status != OcspResponseStatus::Successful {
            return Err(OcspError::Unsuccessful(format!("{:?}", ocsp_response.status)));
        }

        let response_bytes = ocsp_response
            .bytes
            .ok_or_else(|| invalid(&"successful response without body"))?;

        if response_bytes.r#type != ObjectIdentifier::from(oids::OCSP_BASIC) {
            return Err(invalid(&format!(
                "unsupported response type {}",
                response_bytes.r#type
            )));
        }

        let basic_response: BasicOcspResponse =
            rasn::der::decode(&response_bytes.response).map_err(|e| invalid(&e))?;

        let single = basic_response
            .tbs_response_data
            .responses
            .iter()
            .find(|r| r.cert_id.serial_number == cert_id.serial_number)
            .ok_or_else(|| invalid(&"no response for the requested certificate"))?;

        match &single.cert_status {
            CertStatus::Good => {}
            CertStatus::Revoked(info) => log::warn!(
                "OCSP reports certificate {:?} revoked at {}",
                cert_id.serial_number,
                info.revocation_time
            ),
            CertStatus::Unknown(_) => log::warn!(
                "OCSP responder does not know certificate {:?}",
                cert_id.serial_number
            ),
        }

        let mut ocsp_certs = Vec::new();
        for cert in basic_response.certs.iter().flatten() {
            ocsp_certs.push(rasn::der::encode(cert).map_err(|e| invalid(&e))?);
        }

        Ok(Self {
            ocsp_der: der.to_vec(),
            ocsp_certs,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::tests::fixtures::{self, TestPki};

    fn leaf_cert_id(pki: &TestPki, hash: DigestAlgorithm) -> rasn_ocsp::CertId {
        make_ocsp_cert_id(
            &Certificate::from_der(&pki.leaf.der).unwrap(),
            &Certificate::from_der(&pki.intermediate.der).unwrap(),
            hash,
        )
        .unwrap()
    }

    #[test]
    fn cert_id_hashes_issuer_name_and_key() {
        let pki = TestPki::ec("http://localhost");
        let issuer = Certificate::from_der(&pki.intermediate.der).unwrap();

        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);
        assert_eq!(
            id.hash_algorithm.algorithm,
            ObjectIdentifier::from(DigestAlgorithm::Sha1.oid())
        );
        assert_eq!(id.issuer_name_hash.as_ref(), crate::crypto::hash::sha1(issuer.subject()));
        assert_eq!(
            id.issuer_key_hash.as_ref(),
            crate::crypto::hash::sha1(issuer.subject_public_key())
        );

        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha256);
        assert_eq!(id.issuer_key_hash.len(), 32);
    }

    #[test]
    fn request_round_trips_through_der() {
        let pki = TestPki::ec("http://localhost");
        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);

        let der = build_ocsp_request(id.clone()).unwrap();
        let request: rasn_ocsp::OcspRequest = rasn::der::decode(&der).unwrap();

        assert_eq!(request.tbs_request.request_list.len(), 1);
        assert_eq!(request.tbs_request.request_list[0].req_cert, id);
    }

    #[test]
    fn successful_response_yields_responder_certs() {
        let pki = TestPki::ec("http://localhost");
        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);

        let der = fixtures::ocsp::good_response(&pki.intermediate, &id, &[&pki.intermediate]);
        let response = OcspResponse::from_der(&der, &id).unwrap();

        assert_eq!(response.ocsp_der, der);
        assert_eq!(response.ocsp_certs, vec![pki.intermediate.der.clone()]);
    }

    #[test]
    fn non_successful_status_is_an_error() {
        let pki = TestPki::ec("http://localhost");
        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);

        for status in [
            OcspResponseStatus::MalformedRequest,
            OcspResponseStatus::InternalError,
            OcspResponseStatus::TryLater,
            OcspResponseStatus::Unauthorized,
        ] {
            let der = fixtures::ocsp::status_only_response(status);
            assert!(matches!(
                OcspResponse::from_der(&der, &id),
                Err(OcspError::Unsuccessful(_))
            ));
        }
    }

    #[test]
    fn response_for_another_certificate_is_rejected() {
        let pki = TestPki::ec("http://localhost");
        let leaf_id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);

        let other_id = make_ocsp_cert_id(
            &Certificate::from_der(&pki.tsa.der).unwrap(),
            &Certificate::from_der(&pki.intermediate.der).unwrap(),
            DigestAlgorithm::Sha1,
        )
        .unwrap();

        let der = fixtures::ocsp::good_response(&pki.intermediate, &other_id, &[]);
        assert!(matches!(
            OcspResponse::from_der(&der, &leaf_id),
            Err(OcspError::InvalidResponse(_))
        ));
    }

    #[test]
    fn only_basic_responses_are_accepted() {
        let pki = TestPki::ec("http://localhost");
        let id = leaf_cert_id(&pki, DigestAlgorithm::Sha1);

        let der = fixtures::ocsp::good_response(&pki.intermediate, &id, &[]);
        let mut response: rasn_ocsp::OcspResponse = rasn::der::decode(&der).unwrap();
        let bytes = response.bytes.as_mut().unwrap();
        // id-pkix-ocsp-nonce, a well-formed OID that is not id-pkix-ocsp-basic
        bytes.r#type = ObjectIdentifier::new(vec![1, 3, 6, 1, 5, 5, 7, 48, 1, 2]).unwrap();
        let der = rasn::der::encode(&response).unwrap();

        assert!(matches!(
            OcspResponse::from_der(&der, &id),
            Err(OcspError::InvalidResponse(_))
        ));
    }
}
