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

//! End-to-end signing of a document that already carries placeholders.
//!
//! The caller serializes the signature dictionary with
//! [`byte_range_placeholder`] and [`contents_placeholder`], then hands the
//! finished buffer to [`sign_prepared_document`]. Validation data is added
//! afterwards, in the next incremental update, with
//! [`add_validation_data`].
//!
//! [`byte_range_placeholder`]: crate::pdf::byte_range_placeholder
//! [`contents_placeholder`]: crate::pdf::contents_placeholder

use chrono::{DateTime, Utc};

use crate::{
    cms::{self, CmsBuilder},
    crypto::{hash::DigestAlgorithm, raw_signature::Signer, time_stamp::TimeStampClient},
    ltv::{LtvData, LtvGatherer},
    pdf::{
        compute_vri_key, patch_byte_range, patch_contents, read_contents, ByteRangeValues,
        DssBuilder, ObjectRef, ObjectStore, PlaceholderInfo,
    },
    settings::Settings,
    Result,
};

/// Options for [`sign_prepared_document`].
#[derive(Clone, Debug)]
pub struct SignOptions {
    /// Digest of the byte ranges and of the signed attributes.
    pub digest_algorithm: DigestAlgorithm,

    /// Value of the `signing-time` attribute. `None` leaves it out.
    pub signing_time: Option<DateTime<Utc>>,

    /// Bytes to reserve with [`contents_placeholder`] when serializing the
    /// signature dictionary.
    ///
    /// [`contents_placeholder`]: crate::pdf::contents_placeholder
    pub placeholder_size: usize,
}

impl SignOptions {
    /// Options taken from the `signing` settings, with the signing time set
    /// to now.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            digest_algorithm: settings.signing.digest_algorithm,
            signing_time: settings.signing.include_signing_time.then(Utc::now),
            placeholder_size: settings.signing.placeholder_size,
        }
    }
}

impl Default for SignOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// The outcome of patching a signature into a buffer.
#[derive(Clone, Debug)]
pub struct SignedDocument {
    /// The CMS `ContentInfo` (a signature or a document time stamp token).
    pub cms: Vec<u8>,

    /// The decoded `/Contents` value as written, zero padding included.
    pub embedded_contents: Vec<u8>,

    /// The byte range covered by the signature.
    pub byte_range: ByteRangeValues,
}

impl SignedDocument {
    /// Key of this signature's VRI entry.
    pub fn vri_key(&self) -> String {
        compute_vri_key(&self.embedded_contents)
    }
}

/// Sign the newest placeholder in `buffer` in place.
///
/// The byte range is patched first, the covered bytes are hashed and
/// signed, a signature time stamp is attached when `tsa` is given, and the
/// CMS is written into `/Contents`. If it does not fit, the error reports
/// the required size so the caller can re-serialize with a larger
/// placeholder.
pub async fn sign_prepared_document(
    buffer: &mut [u8],
    signer: &dyn Signer,
    options: &SignOptions,
    tsa: Option<&TimeStampClient>,
) -> Result<SignedDocument> {
    let (info, byte_range, signed_bytes) = prepare(buffer)?;

    let digest = options.digest_algorithm.digest(&signed_bytes);

    let mut cms = CmsBuilder::new(signer, options.digest_algorithm)
        .with_signing_time(options.signing_time)
        .sign_digest(&digest)
        .await?;

    if let Some(tsa) = tsa {
        let token = tsa
            .request_time_stamp(&cms::signature_value(&cms)?)
            .await?;
        cms = cms::attach_timestamp(&cms, &token)?;
    }

    patch_contents(buffer, &info, &cms)?;
    let embedded_contents = read_contents(buffer, &info)?;

    log::debug!(
        "signed byte range {:?} with {} byte CMS",
        byte_range.as_array(),
        cms.len()
    );

    Ok(SignedDocument {
        cms,
        embedded_contents,
        byte_range,
    })
}

/// Fill the newest placeholder in `buffer` with an RFC 3161 document time
/// stamp (sub-filter `ETSI.RFC3161`) over the byte range.
pub async fn timestamp_prepared_document(
    buffer: &mut [u8],
    tsa: &TimeStampClient,
) -> Result<SignedDocument> {
    let (info, byte_range, signed_bytes) = prepare(buffer)?;

    let token = tsa.request_time_stamp(&signed_bytes).await?;

    patch_contents(buffer, &info, &token)?;
    let embedded_contents = read_contents(buffer, &info)?;

    Ok(SignedDocument {
        cms: token,
        embedded_contents,
        byte_range,
    })
}

fn prepare(buffer: &mut [u8]) -> Result<(PlaceholderInfo, ByteRangeValues, Vec<u8>)> {
    let info = PlaceholderInfo::locate(buffer)?;
    let byte_range = info.byte_range(buffer.len());

    patch_byte_range(buffer, &info, &byte_range)?;
    let signed_bytes = byte_range.signed_bytes(buffer)?;

    Ok((info, byte_range, signed_bytes))
}

/// Gather validation data for each of `signatures` and merge it into the
/// document's DSS.
///
/// Each signature must be passed exactly as it sits in `/Contents`, padding
/// included, so the VRI keys match. Returns the new DSS dictionary
/// reference along with what was gathered, warnings included.
pub async fn add_validation_data(
    store: &mut dyn ObjectStore,
    gatherer: &LtvGatherer,
    signatures: &[Vec<u8>],
) -> Result<(ObjectRef, Vec<LtvData>)> {
    let mut gathered = Vec::with_capacity(signatures.len());
    for signature in signatures {
        gathered.push(gatherer.gather(signature).await?);
    }

    let mut dss = DssBuilder::from_catalog(store)?;
    for ltv in &gathered {
        dss.add_ltv_data(ltv);
    }

    Ok((dss.build(store)?, gathered))
}
