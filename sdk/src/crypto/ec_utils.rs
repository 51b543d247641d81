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

//! Helpers for ECDSA signature encodings.
//!
//! CMS carries ECDSA signatures as DER `SEQUENCE { r INTEGER, s INTEGER }`,
//! while KMS services and hardware tokens often hand back the fixed-width
//! IEEE P1363 `r || s` form.

use x509_parser::der_parser::{
    der::{parse_der_integer, parse_der_sequence_defined_g},
    error::BerResult,
};

use crate::crypto::raw_signature::SignerError;

/// NIST curves supported by the signers in this crate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum EcdsaCurve {
    /// NIST curve P-256
    P256,

    /// NIST curve P-384
    P384,
}

impl EcdsaCurve {
    /// Returns the P1363 `r || s` signature size for a given curve.
    pub(crate) fn p1363_sig_len(&self) -> usize {
        match self {
            EcdsaCurve::P256 => 64,
            EcdsaCurve::P384 => 96,
        }
    }

    fn from_p1363_len(len: usize) -> Option<Self> {
        [EcdsaCurve::P256, EcdsaCurve::P384]
            .into_iter()
            .find(|curve| curve.p1363_sig_len() == len)
    }
}

fn parse_ec_der_sig(data: &[u8]) -> BerResult<'_, ()> {
    parse_der_sequence_defined_g(|content: &[u8], _| {
        let (rem, _r) = parse_der_integer(content)?;
        let (rem, _s) = parse_der_integer(rem)?;
        Ok((rem, ()))
    })(data)
}

/// Returns `true` if `sig` is exactly one DER `SEQUENCE` of two integers.
pub(crate) fn is_der_signature(sig: &[u8]) -> bool {
    matches!(parse_ec_der_sig(sig), Ok((rem, ())) if rem.is_empty())
}

/// Convert a P1363 `r || s` signature into its DER form.
pub(crate) fn p1363_to_der(sig: &[u8]) -> Result<Vec<u8>, SignerError> {
    let curve = EcdsaCurve::from_p1363_len(sig.len()).ok_or_else(|| {
        SignerError::InternalError(format!(
            "unexpected ECDSA signature length {}",
            sig.len()
        ))
    })?;

    let der = match curve {
        EcdsaCurve::P256 => p256::ecdsa::Signature::from_slice(sig)
            .map(|s| s.to_der().as_bytes().to_vec()),
        EcdsaCurve::P384 => p384::ecdsa::Signature::from_slice(sig)
            .map(|s| s.to_der().as_bytes().to_vec()),
    };

    der.map_err(|e| SignerError::InternalError(format!("invalid ECDSA signature: {e}")))
}

/// Returns the DER form of an ECDSA signature, converting from P1363 if
/// required.
pub(crate) fn normalize_ecdsa_signature(sig: &[u8]) -> Result<Vec<u8>, SignerError> {
    if is_der_signature(sig) {
        Ok(sig.to_vec())
    } else {
        p1363_to_der(sig)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn p1363_round_trips_through_der() {
        let key = SigningKey::random(&mut OsRng);
        let sig: Signature = key.sign(b"some data");

        let raw = sig.to_bytes().to_vec();
        assert_eq!(raw.len(), EcdsaCurve::P256.p1363_sig_len());
        assert!(!is_der_signature(&raw));

        let der = normalize_ecdsa_signature(&raw).unwrap();
        assert!(is_der_signature(&der));
        assert_eq!(der, sig.to_der().as_bytes());

        // Already DER: passed through untouched.
        assert_eq!(normalize_ecdsa_signature(&der).unwrap(), der);
    }

    #[test]
    fn rejects_unknown_lengths() {
        assert!(p1363_to_der(&[1u8; 10]).is_err());
    }
}
