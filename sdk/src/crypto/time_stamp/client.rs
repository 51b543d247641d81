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

use std::sync::Arc;

use rand::Rng;
use rasn::prelude::*;

use super::{
    response::{signed_data_from_token, tst_info_from_signed_data, TimeStampResponse},
    TimeStampError,
};
use crate::{
    crypto::{
        asn1::rfc3161::{MessageImprint, TimeStampReq},
        hash::DigestAlgorithm,
    },
    http::{AsyncHttpResolver, HttpClient},
    settings::Settings,
};

const HTTP_CONTENT_TYPE_REQUEST: &str = "application/timestamp-query";
const HTTP_CONTENT_TYPE_RESPONSE: &str = "application/timestamp-reply";

/// Requests [RFC 3161] time stamp tokens from one time stamp authority.
///
/// [RFC 3161]: https://datatracker.ietf.org/doc/html/rfc3161
#[derive(Clone)]
pub struct TimeStampClient {
    http: HttpClient,
    url: String,
    digest_algorithm: DigestAlgorithm,
    request_certificate: bool,
}

impl TimeStampClient {
    /// Create a client for the TSA named in `settings.time_stamp.url`.
    pub fn new(
        resolver: Arc<dyn AsyncHttpResolver>,
        settings: &Settings,
    ) -> Result<Self, TimeStampError> {
        let url = settings
            .time_stamp
            .url
            .clone()
            .ok_or(TimeStampError::NoUrl)?;

        Ok(Self::with_url(resolver, url, settings))
    }

    /// Create a client for `url`, taking everything else from `settings`.
    pub fn with_url(
        resolver: Arc<dyn AsyncHttpResolver>,
        url: impl Into<String>,
        settings: &Settings,
    ) -> Self {
        Self {
            http: HttpClient::new(resolver, &settings.network),
            url: url.into(),
            digest_algorithm: settings.time_stamp.digest_algorithm,
            request_certificate: settings.time_stamp.request_certificate,
        }
    }

    /// The TSA endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Digest algorithm of the message imprint.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Request a time stamp over `message`.
    ///
    /// `message` is hashed with [`Self::digest_algorithm`]; for a CMS
    /// signature time stamp it is the `SignerInfo` signature value, for a
    /// document time stamp the signed byte ranges. Returns the DER-encoded
    /// `TimeStampToken`, a CMS `ContentInfo`.
    pub async fn request_time_stamp(&self, message: &[u8]) -> Result<Vec<u8>, TimeStampError> {
        let nonce = rand::thread_rng().gen_range(1..i64::MAX);
        self.request_with_nonce(message, nonce).await
    }

    pub(crate) async fn request_with_nonce(
        &self,
        message: &[u8],
        nonce: i64,
    ) -> Result<Vec<u8>, TimeStampError> {
        let request = TimeStampReq {
            version: 1,
            message_imprint: MessageImprint {
                hash_algorithm: self.digest_algorithm.algorithm_identifier(),
                hashed_message: OctetString::from(self.digest_algorithm.digest(message)),
            },
            req_policy: None,
            nonce: Some(Integer::from(nonce)),
            cert_req: self.request_certificate,
            extensions: None,
        };

        let body =
            rasn::der::encode(&request).map_err(|e| TimeStampError::EncodeError(e.to_string()))?;

        let response_bytes = self
            .http
            .post(
                &self.url,
                HTTP_CONTENT_TYPE_REQUEST,
                HTTP_CONTENT_TYPE_RESPONSE,
                body,
            )
            .await?;

        let response = TimeStampResponse::from_der(&response_bytes)?;

        if !response.is_success() {
            return Err(TimeStampError::Rejected {
                status: response.status.status,
                reason: response.status_text(),
            });
        }

        let token = response.token().ok_or(TimeStampError::NoToken)?;

        let signed_data = signed_data_from_token(token)?;
        let tst_info = tst_info_from_signed_data(&signed_data)?.ok_or_else(|| {
            TimeStampError::DecodeError("time stamp token has no TSTInfo".to_string())
        })?;

        // Verify nonce was reflected.
        if tst_info.nonce != request.nonce {
            return Err(TimeStampError::NonceMismatch);
        }

        if tst_info.message_imprint.hash_algorithm.algorithm
            != request.message_imprint.hash_algorithm.algorithm
            || tst_info.message_imprint.hashed_message
                != request.message_imprint.hashed_message
        {
            return Err(TimeStampError::ImprintMismatch);
        }

        log::debug!("time stamp from {} ({} byte token)", self.url, token.len());

        Ok(token.to_vec())
    }
}
