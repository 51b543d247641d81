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

//! Signed OCSP responses.

use chrono::{DateTime, Duration, FixedOffset};
use rasn::prelude::*;
use rasn_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspResponse, OcspResponseStatus, ResponderId,
    ResponseBytes, ResponseData, SingleResponse,
};

use super::{der, TestCert};
use crate::crypto::asn1::oids;

/// A `successful` response reporting `cert_id` as good, signed by
/// `responder` and embedding `certs`.
pub(crate) fn good_response(
    responder: &TestCert,
    cert_id: &CertId,
    certs: &[&TestCert],
) -> Vec<u8> {
    let now: DateTime<FixedOffset> = super::now().into();

    let tbs_response_data = ResponseData {
        version: rasn_ocsp::Version::from(0u8),
        responder_id: ResponderId::ByName(responder.certificate().tbs_certificate.subject),
        produced_at: now,
        responses: vec![SingleResponse {
            cert_id: cert_id.clone(),
            cert_status: CertStatus::Good,
            this_update: now,
            next_update: Some(now + Duration::days(7)),
            single_extensions: None,
        }],
        response_extensions: None,
    };

    let signature = responder.sign(&der(&tbs_response_data));

    let basic = BasicOcspResponse {
        tbs_response_data,
        signature_algorithm: responder.signature_algorithm(),
        signature: BitString::from_slice(&signature),
        certs: (!certs.is_empty()).then(|| certs.iter().map(|c| c.certificate()).collect()),
    };

    der(&OcspResponse {
        status: OcspResponseStatus::Successful,
        bytes: Some(ResponseBytes {
            r#type: ObjectIdentifier::from(oids::OCSP_BASIC),
            response: OctetString::from(der(&basic)),
        }),
    })
}

/// A response carrying nothing but `status`.
pub(crate) fn status_only_response(status: OcspResponseStatus) -> Vec<u8> {
    der(&OcspResponse {
        status,
        bytes: None,
    })
}
