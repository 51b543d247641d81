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

use async_trait::async_trait;
use thiserror::Error;

use super::{kms::KmsSignerError, KeyType, SignatureAlgorithm};
use crate::crypto::hash::DigestAlgorithm;

/// Implementations of the `Signer` trait produce raw signature bytes for a
/// CMS `SignerInfo`.
///
/// A signer owns no document state and may be reused for any number of
/// signing operations.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Return the DER-encoded signing certificate.
    fn certificate(&self) -> &[u8];

    /// Return the DER-encoded certificates that accompany the signing
    /// certificate, ordered from its issuer toward the root. The signing
    /// certificate itself is not repeated here.
    fn certificate_chain(&self) -> &[Vec<u8>];

    /// Return the type of the signing key.
    fn key_type(&self) -> KeyType;

    /// Return the signature scheme implemented by this signer.
    fn signature_algorithm(&self) -> SignatureAlgorithm;

    /// Hash `data` with `digest_algorithm` and sign the result.
    ///
    /// For ECDSA keys the signature may be returned either DER-encoded or in
    /// the fixed-width `r || s` form; the CMS builder normalizes it.
    async fn sign(
        &self,
        data: &[u8],
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Vec<u8>, SignerError>;
}

#[async_trait]
impl<T: Signer + ?Sized> Signer for Box<T> {
    fn certificate(&self) -> &[u8] {
        (**self).certificate()
    }

    fn certificate_chain(&self) -> &[Vec<u8>] {
        (**self).certificate_chain()
    }

    fn key_type(&self) -> KeyType {
        (**self).key_type()
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        (**self).signature_algorithm()
    }

    async fn sign(
        &self,
        data: &[u8],
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Vec<u8>, SignerError> {
        (**self).sign(data, digest_algorithm).await
    }
}

/// Describes errors that can be identified when loading signing credentials
/// or generating a raw signature.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignerError {
    /// The PKCS#12 integrity check failed, which almost always means the
    /// password is wrong.
    #[error("invalid credentials: the password does not unlock this key store")]
    InvalidCredentials,

    /// The PKCS#12 data could not be parsed.
    #[error("invalid PKCS#12 data: {0}")]
    InvalidPkcs12(String),

    /// The PKCS#12 data uses an encryption scheme this crate does not
    /// implement.
    #[error("unsupported PKCS#12 encryption scheme: {0}")]
    UnsupportedEncryption(String),

    /// No private key was found in the supplied credentials.
    #[error("no private key found")]
    NoPrivateKey,

    /// No certificate matching the private key was found.
    #[error("no certificate found for the private key")]
    NoCertificate,

    /// The private key could not be decoded.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The key algorithm or curve is not supported.
    #[error("unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// The key cannot produce a signature with the requested digest.
    #[error("unsupported digest algorithm {0} for this key")]
    UnsupportedDigest(DigestAlgorithm),

    /// The signing certificate could not be parsed.
    #[error("invalid signing certificate: {0}")]
    InvalidCertificate(String),

    /// The certificate's public key does not belong to the private key.
    #[error("the certificate does not match the private key")]
    KeyMismatch,

    /// The remote KMS signer failed.
    #[error(transparent)]
    Kms(#[from] KmsSignerError),

    /// An unexpected internal error occured while signing.
    #[error("internal error ({0})")]
    InternalError(String),
}
