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

use rasn::prelude::*;

use crate::crypto::{
    asn1::{
        oids,
        rfc3161::{pki_status, TimeStampResp, TstInfo},
        rfc5652::SignedData,
        ContentInfo,
    },
    time_stamp::TimeStampError,
};

pub(crate) struct TimeStampResponse(pub(crate) TimeStampResp);

impl std::ops::Deref for TimeStampResponse {
    type Target = TimeStampResp;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TimeStampResponse {
    pub(crate) fn from_der(data: &[u8]) -> Result<Self, TimeStampError> {
        // Some TSAs answer in BER.
        rasn::ber::decode(data)
            .map(Self)
            .map_err(|e| TimeStampError::DecodeError(e.to_string()))
    }

    /// Return `true` if the request was successful.
    pub(crate) fn is_success(&self) -> bool {
        matches!(
            self.0.status.status,
            pki_status::GRANTED | pki_status::GRANTED_WITH_MODS
        )
    }

    /// The TSA's free text, joined into one line.
    pub(crate) fn status_text(&self) -> String {
        match &self.0.status.status_string {
            Some(text) if !text.is_empty() => text
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "no reason given".to_string(),
        }
    }

    /// The `TimeStampToken` TLV, byte for byte as the TSA sent it.
    pub(crate) fn token(&self) -> Option<&[u8]> {
        self.0.time_stamp_token.as_ref().map(|t| t.as_bytes())
    }
}

/// Decode the `SignedData` inside a `TimeStampToken`.
pub(crate) fn signed_data_from_token(token: &[u8]) -> Result<SignedData, TimeStampError> {
    let content_info: ContentInfo =
        rasn::ber::decode(token).map_err(|e| TimeStampError::DecodeError(e.to_string()))?;

    if content_info.content_type != ObjectIdentifier::from(oids::ID_SIGNED_DATA) {
        return Err(TimeStampError::DecodeError(
            "time stamp has invalid OID".to_string(),
        ));
    }

    rasn::ber::decode(content_info.content.as_bytes())
        .map_err(|e| TimeStampError::DecodeError(e.to_string()))
}

pub(crate) fn tst_info_from_signed_data(
    signed_data: &SignedData,
) -> Result<Option<TstInfo>, TimeStampError> {
    if signed_data.encap_content_info.content_type != ObjectIdentifier::from(oids::ID_CT_TST_INFO)
    {
        return Ok(None);
    }

    let Some(content) = &signed_data.encap_content_info.content else {
        return Ok(None);
    };

    Ok(Some(
        rasn::der::decode(content).map_err(|e| TimeStampError::DecodeError(e.to_string()))?,
    ))
}
