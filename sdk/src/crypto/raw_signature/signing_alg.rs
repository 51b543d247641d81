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

use std::fmt;

use rasn::types::{Any, ObjectIdentifier, Oid};
use rasn_pkix::AlgorithmIdentifier;

use super::SignerError;
use crate::crypto::{
    asn1::{oids, rfc4055::RsassaPssParams},
    hash::DigestAlgorithm,
};

/// The type of key held by a [`Signer`](super::Signer).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyType {
    /// RSA
    Rsa,

    /// Elliptic curve (NIST P-256 or P-384)
    Ec,
}

/// Signature schemes a [`Signer`](super::Signer) may implement.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5
    RsaPkcs1v15,

    /// RSASSA-PSS with MGF1 over the message digest and a salt as long as
    /// the digest
    RsaPss,

    /// ECDSA
    Ecdsa,
}

impl SignatureAlgorithm {
    /// The key type this scheme requires.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::RsaPkcs1v15 | Self::RsaPss => KeyType::Rsa,
            Self::Ecdsa => KeyType::Ec,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RsaPkcs1v15 => "RSASSA-PKCS1-v1_5",
            Self::RsaPss => "RSASSA-PSS",
            Self::Ecdsa => "ECDSA",
        })
    }
}

const DER_NULL: [u8; 2] = [0x05, 0x00];

/// Build the `signatureAlgorithm` identifier of a `SignerInfo`.
pub(crate) fn signature_algorithm_identifier(
    alg: SignatureAlgorithm,
    digest: DigestAlgorithm,
) -> Result<AlgorithmIdentifier, SignerError> {
    match alg {
        SignatureAlgorithm::RsaPkcs1v15 => {
            let oid: &'static Oid = match digest {
                DigestAlgorithm::Sha1 => oids::SHA1_WITH_RSA,
                DigestAlgorithm::Sha256 => oids::SHA256_WITH_RSA,
                DigestAlgorithm::Sha384 => oids::SHA384_WITH_RSA,
                DigestAlgorithm::Sha512 => oids::SHA512_WITH_RSA,
            };
            Ok(AlgorithmIdentifier {
                algorithm: ObjectIdentifier::from(oid),
                parameters: Some(Any::new(DER_NULL.to_vec())),
            })
        }

        SignatureAlgorithm::RsaPss => {
            let hash = digest.algorithm_identifier();
            let mgf_params = rasn::der::encode(&hash)
                .map_err(|e| SignerError::InternalError(e.to_string()))?;

            let params = RsassaPssParams {
                hash_algorithm: Some(hash),
                mask_gen_algorithm: Some(AlgorithmIdentifier {
                    algorithm: ObjectIdentifier::from(oids::MGF1),
                    parameters: Some(Any::new(mgf_params)),
                }),
                salt_length: Some(digest.output_len() as u32),
                trailer_field: None,
            };

            let params = rasn::der::encode(&params)
                .map_err(|e| SignerError::InternalError(e.to_string()))?;

            Ok(AlgorithmIdentifier {
                algorithm: ObjectIdentifier::from(oids::RSASSA_PSS),
                parameters: Some(Any::new(params)),
            })
        }

        SignatureAlgorithm::Ecdsa => {
            let oid: &'static Oid = match digest {
                DigestAlgorithm::Sha1 => oids::ECDSA_WITH_SHA1,
                DigestAlgorithm::Sha256 => oids::ECDSA_WITH_SHA256,
                DigestAlgorithm::Sha384 => oids::ECDSA_WITH_SHA384,
                DigestAlgorithm::Sha512 => oids::ECDSA_WITH_SHA512,
            };
            Ok(AlgorithmIdentifier {
                algorithm: ObjectIdentifier::from(oid),
                parameters: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn rsa_pkcs1_has_null_parameters() {
        let id = signature_algorithm_identifier(
            SignatureAlgorithm::RsaPkcs1v15,
            DigestAlgorithm::Sha256,
        )
        .unwrap();

        assert_eq!(id.algorithm, oids::SHA256_WITH_RSA);
        assert_eq!(id.parameters.unwrap().as_bytes(), &DER_NULL);
    }

    #[test]
    fn pss_parameters_name_the_digest() {
        let id =
            signature_algorithm_identifier(SignatureAlgorithm::RsaPss, DigestAlgorithm::Sha384)
                .unwrap();

        assert_eq!(id.algorithm, oids::RSASSA_PSS);

        let params: RsassaPssParams =
            rasn::der::decode(id.parameters.unwrap().as_bytes()).unwrap();
        assert_eq!(params.hash_algorithm.unwrap().algorithm, oids::SHA384);
        assert_eq!(params.mask_gen_algorithm.unwrap().algorithm, oids::MGF1);
        assert_eq!(params.salt_length, Some(48));
    }

    #[test]
    fn ecdsa_omits_parameters() {
        let id = signature_algorithm_identifier(SignatureAlgorithm::Ecdsa, DigestAlgorithm::Sha512)
            .unwrap();

        assert_eq!(id.algorithm, oids::ECDSA_WITH_SHA512);
        assert!(id.parameters.is_none());
        assert_eq!(SignatureAlgorithm::Ecdsa.key_type(), KeyType::Ec);
    }
}
