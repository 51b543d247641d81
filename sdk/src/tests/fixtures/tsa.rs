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

//! RFC 3161 time stamp tokens and responses, and a resolver that plays TSA.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use http::{Request, Response};
use rand::Rng;
use rasn::{prelude::*, types::Oid};

use super::{der, TestCert};
use crate::{
    cms::encode_signed_data,
    crypto::{
        asn1::{
            oids,
            rfc3161::{MessageImprint, PkiStatusInfo, TimeStampReq, TimeStampResp, TstInfo},
            rfc5035::{EssCertIdV2, SigningCertificateV2},
            rfc5652::{
                Attribute, EncapsulatedContentInfo, IssuerAndSerialNumber, SignedData,
                SignerIdentifier, SignerInfo,
            },
        },
        hash::DigestAlgorithm,
    },
    http::{AsyncHttpResolver, HttpResolverError},
};

const TSA_POLICY: &Oid = Oid::const_new(&[1, 2, 3, 4, 1]);

/// A token from `tsa` over `imprint`, which must already be hashed with
/// `alg`.
pub(crate) fn time_stamp_token(
    tsa: &TestCert,
    alg: DigestAlgorithm,
    imprint: &[u8],
    nonce: Option<i64>,
) -> Vec<u8> {
    let message_imprint = MessageImprint {
        hash_algorithm: alg.algorithm_identifier(),
        hashed_message: OctetString::from(imprint.to_vec()),
    };

    token(tsa, message_imprint, nonce.map(Integer::from))
}

fn token(tsa: &TestCert, message_imprint: MessageImprint, nonce: Option<Integer>) -> Vec<u8> {
    let tst_info = TstInfo {
        version: 1,
        policy: ObjectIdentifier::from(TSA_POLICY),
        message_imprint,
        serial_number: Integer::from(rand::thread_rng().gen_range(1..i64::MAX)),
        gen_time: DateTime::<FixedOffset>::from(super::now()),
        accuracy: None,
        ordering: false,
        nonce,
        tsa: None,
        extensions: None,
    };
    let content = der(&tst_info);

    let mut signed_attrs = SetOf::new();
    signed_attrs.insert(Attribute::new(
        oids::CONTENT_TYPE,
        der(&ObjectIdentifier::from(oids::ID_CT_TST_INFO)),
    ));
    signed_attrs.insert(Attribute::new(
        oids::MESSAGE_DIGEST,
        der(&OctetString::from(DigestAlgorithm::Sha256.digest(&content))),
    ));
    signed_attrs.insert(Attribute::new(
        oids::SIGNING_CERTIFICATE_V2,
        der(&SigningCertificateV2 {
            certs: vec![EssCertIdV2 {
                hash_algorithm: None,
                cert_hash: OctetString::from(DigestAlgorithm::Sha256.digest(&tsa.der)),
                issuer_serial: None,
            }],
            policies: None,
        }),
    ));

    let signature = tsa.sign(&der(&signed_attrs));
    let cert = tsa.certificate();

    let mut signer_infos = SetOf::new();
    signer_infos.insert(SignerInfo {
        version: 1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: cert.tbs_certificate.issuer,
            serial_number: cert.tbs_certificate.serial_number,
        }),
        digest_algorithm: DigestAlgorithm::Sha256.algorithm_identifier(),
        signed_attrs: Some(signed_attrs),
        signature_algorithm: tsa.signature_algorithm(),
        signature: OctetString::from(signature),
        unsigned_attrs: None,
    });

    let mut digest_algorithms = SetOf::new();
    digest_algorithms.insert(DigestAlgorithm::Sha256.algorithm_identifier());

    let mut certificates = SetOf::new();
    certificates.insert(Any::new(tsa.der.clone()));

    encode_signed_data(&SignedData {
        version: 3,
        digest_algorithms,
        encap_content_info: EncapsulatedContentInfo {
            content_type: ObjectIdentifier::from(oids::ID_CT_TST_INFO),
            content: Some(OctetString::from(content)),
        },
        certificates: Some(certificates),
        crls: None,
        signer_infos,
    })
    .unwrap()
}

/// A `granted` response carrying `token`.
pub(crate) fn granted_response(token: &[u8]) -> Vec<u8> {
    der(&TimeStampResp {
        status: PkiStatusInfo {
            status: 0,
            status_string: None,
            fail_info: None,
        },
        time_stamp_token: Some(Any::new(token.to_vec())),
    })
}

/// A response with `status` and a single line of free text.
pub(crate) fn rejected_response(status: u32, reason: &str) -> Vec<u8> {
    der(&TimeStampResp {
        status: PkiStatusInfo {
            status,
            status_string: Some(vec![reason.to_string()]),
            fail_info: None,
        },
        time_stamp_token: None,
    })
}

/// Answers every request with a token from its TSA certificate, echoing the
/// request's imprint and nonce.
pub(crate) struct FakeTsa {
    tsa: TestCert,
    requests: AtomicUsize,
}

impl FakeTsa {
    pub(crate) fn new(tsa: &TestCert) -> Self {
        Self {
            tsa: tsa.clone(),
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of requests answered so far.
    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AsyncHttpResolver for FakeTsa {
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResolverError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let query: TimeStampReq = rasn::der::decode(request.body())
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let body = granted_response(&token(&self.tsa, query.message_imprint, query.nonce));

        Ok(Response::builder()
            .status(200)
            .header("content-type", "application/timestamp-reply")
            .body(body)?)
    }
}
