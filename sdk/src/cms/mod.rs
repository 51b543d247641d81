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

//! Detached CMS `SignedData` ([RFC 5652]) in the CAdES-BES profile, plus
//! the helpers needed to read one back out of a signature dictionary.
//!
//! [RFC 5652]: https://www.rfc-editor.org/rfc/rfc5652

mod builder;

pub use builder::CmsBuilder;
use der::{Decode, Encode};
use rasn::prelude::*;
use thiserror::Error;

use crate::crypto::{
    asn1::{
        oids,
        rfc5652::{Attribute, SignedData, SignerIdentifier, SignerInfo},
        ContentInfo,
    },
    raw_signature::SignerError,
};

/// Describes errors that can occur while building or reading CMS data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CmsError {
    /// The signer failed.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// A structure could not be encoded.
    #[error("unable to encode CMS: {0}")]
    Encoding(String),

    /// The bytes are not a CMS `ContentInfo`.
    #[error("unable to decode CMS: {0}")]
    Decoding(String),

    /// The `ContentInfo` does not carry `SignedData`.
    #[error("CMS content is not SignedData")]
    NotSignedData,

    /// The `SignedData` has no `SignerInfo`.
    #[error("CMS contains no SignerInfo")]
    NoSignerInfo,
}

/// Length of the DER TLV at the start of `bytes`, header included.
///
/// `/Contents` is zero-padded to the reserved size. Trailing zeros may be
/// legitimate content, so the real end is read from the outer length.
pub fn der_content_length(bytes: &[u8]) -> Result<usize, CmsError> {
    let error = |e: der::Error| CmsError::Decoding(e.to_string());

    let mut reader = der::SliceReader::new(bytes).map_err(error)?;
    let header = der::Header::decode(&mut reader).map_err(error)?;

    let header_len: usize = header.encoded_len().map_err(error)?.try_into().map_err(error)?;
    let content_len: usize = header.length.try_into().map_err(error)?;
    let total = header_len + content_len;

    if total > bytes.len() {
        return Err(CmsError::Decoding(format!(
            "DER length {total} exceeds the {} available bytes",
            bytes.len()
        )));
    }

    Ok(total)
}

/// `bytes` without trailing padding.
pub fn strip_padding(bytes: &[u8]) -> Result<&[u8], CmsError> {
    Ok(&bytes[..der_content_length(bytes)?])
}

pub(crate) fn decode_signed_data(cms: &[u8]) -> Result<SignedData, CmsError> {
    let cms = strip_padding(cms)?;

    let content_info: ContentInfo =
        rasn::ber::decode(cms).map_err(|e| CmsError::Decoding(e.to_string()))?;

    if content_info.content_type != ObjectIdentifier::from(oids::ID_SIGNED_DATA) {
        return Err(CmsError::NotSignedData);
    }

    rasn::ber::decode(content_info.content.as_bytes())
        .map_err(|e| CmsError::Decoding(e.to_string()))
}

pub(crate) fn encode_signed_data(signed_data: &SignedData) -> Result<Vec<u8>, CmsError> {
    let content =
        rasn::der::encode(signed_data).map_err(|e| CmsError::Encoding(e.to_string()))?;

    rasn::der::encode(&ContentInfo {
        content_type: ObjectIdentifier::from(oids::ID_SIGNED_DATA),
        content: Any::new(content),
    })
    .map_err(|e| CmsError::Encoding(e.to_string()))
}

/// The DER certificates embedded in `cms`, in encoded order.
pub fn embedded_certificates(cms: &[u8]) -> Result<Vec<Vec<u8>>, CmsError> {
    let signed_data = decode_signed_data(cms)?;
    Ok(certificates_of(&signed_data))
}

pub(crate) fn certificates_of(signed_data: &SignedData) -> Vec<Vec<u8>> {
    signed_data
        .certificates
        .as_ref()
        .map(|certs| certs.to_vec())
        .unwrap_or_default()
        .into_iter()
        // Other CertificateChoices are context tagged.
        .filter(|cert| cert.as_bytes().first() == Some(&0x30))
        .map(|cert| cert.as_bytes().to_vec())
        .collect()
}

/// The certificate that produced the first `SignerInfo` of `cms`.
///
/// The certificate is matched on issuer and serial number. If nothing
/// matches, the first embedded certificate is returned. `None` means `cms`
/// embeds no certificates at all.
pub fn signer_certificate(cms: &[u8]) -> Result<Option<Vec<u8>>, CmsError> {
    let signed_data = decode_signed_data(cms)?;
    let certs = certificates_of(&signed_data);

    let signer_info = signed_data
        .signer_infos
        .to_vec()
        .into_iter()
        .next()
        .ok_or(CmsError::NoSignerInfo)?;

    if let SignerIdentifier::IssuerAndSerialNumber(id) = &signer_info.sid {
        for der in &certs {
            let Ok(cert) = rasn::der::decode::<rasn_pkix::Certificate>(der) else {
                continue;
            };

            if cert.tbs_certificate.issuer == id.issuer
                && cert.tbs_certificate.serial_number == id.serial_number
            {
                return Ok(Some(der.clone()));
            }
        }
    }

    Ok(certs.into_iter().next())
}

/// The signature value of the first `SignerInfo`, the message an RFC 3161
/// signature time stamp covers.
pub fn signature_value(cms: &[u8]) -> Result<Vec<u8>, CmsError> {
    let signed_data = decode_signed_data(cms)?;

    signed_data
        .signer_infos
        .to_vec()
        .into_iter()
        .next()
        .map(|si| si.signature.to_vec())
        .ok_or(CmsError::NoSignerInfo)
}

/// The `id-aa-timeStampToken` tokens in the unsigned attributes of every
/// `SignerInfo`.
pub fn embedded_time_stamps(cms: &[u8]) -> Result<Vec<Vec<u8>>, CmsError> {
    let signed_data = decode_signed_data(cms)?;
    let token_oid = ObjectIdentifier::from(oids::TIME_STAMP_TOKEN);

    let mut tokens = Vec::new();
    for signer_info in signed_data.signer_infos.to_vec() {
        let unsigned_attrs = signer_info.unsigned_attrs.as_ref().map(|a| a.to_vec());
        for attr in unsigned_attrs.unwrap_or_default() {
            if attr.attr_type == token_oid {
                tokens.extend(attr.attr_values.to_vec().iter().map(|v| v.as_bytes().to_vec()));
            }
        }
    }

    Ok(tokens)
}

/// Add `token` as an `id-aa-timeStampToken` unsigned attribute of the first
/// `SignerInfo`.
///
/// The signed attributes and the signature value are left untouched, which
/// is what lifts a B-B signature to B-T.
pub fn attach_timestamp(cms: &[u8], token: &[u8]) -> Result<Vec<u8>, CmsError> {
    let mut signed_data = decode_signed_data(cms)?;

    let mut signer_infos: Vec<SignerInfo> =
        signed_data.signer_infos.to_vec().into_iter().cloned().collect();
    let first = signer_infos.first_mut().ok_or(CmsError::NoSignerInfo)?;

    let mut unsigned_attrs = first.unsigned_attrs.take().unwrap_or_else(SetOf::new);
    unsigned_attrs.insert(Attribute::new(oids::TIME_STAMP_TOKEN, token.to_vec()));
    first.unsigned_attrs = Some(unsigned_attrs);

    let mut rebuilt = SetOf::new();
    for signer_info in signer_infos {
        rebuilt.insert(signer_info);
    }
    signed_data.signer_infos = rebuilt;

    encode_signed_data(&signed_data)
}
