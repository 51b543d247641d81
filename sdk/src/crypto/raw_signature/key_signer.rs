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

//! Signing with a private key held in process memory.

use async_trait::async_trait;
use ecdsa::signature::hazmat::PrehashSigner;
use pkcs8::{DecodePrivateKey, EncodePublicKey, ObjectIdentifier, PrivateKeyInfo};
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use spki::SubjectPublicKeyInfoRef;

use super::{KeyType, SignatureAlgorithm, Signer, SignerError};
use crate::{certificate::Certificate, crypto::hash::DigestAlgorithm};

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const PRIME256V1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// A private key the caller already holds.
#[derive(Clone)]
pub enum PrivateKey {
    /// RSA key of any supported size.
    Rsa(Box<RsaPrivateKey>),

    /// NIST P-256 ECDSA key.
    P256(p256::ecdsa::SigningKey),

    /// NIST P-384 ECDSA key.
    P384(p384::ecdsa::SigningKey),
}

impl PrivateKey {
    /// Decode an unencrypted PKCS#8 `PrivateKeyInfo`.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, SignerError> {
        let info =
            PrivateKeyInfo::try_from(der).map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        let invalid = |e: pkcs8::Error| SignerError::InvalidKey(e.to_string());

        if info.algorithm.oid == RSA_ENCRYPTION_OID {
            let key = RsaPrivateKey::from_pkcs8_der(der).map_err(invalid)?;
            return Ok(Self::Rsa(Box::new(key)));
        }

        if info.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(SignerError::UnsupportedKeyAlgorithm(
                info.algorithm.oid.to_string(),
            ));
        }

        match info.algorithm.parameters_oid() {
            Ok(curve) if curve == PRIME256V1_OID => Ok(Self::P256(
                p256::ecdsa::SigningKey::from_pkcs8_der(der).map_err(invalid)?,
            )),
            Ok(curve) if curve == SECP384R1_OID => Ok(Self::P384(
                p384::ecdsa::SigningKey::from_pkcs8_der(der).map_err(invalid)?,
            )),
            Ok(curve) => Err(SignerError::UnsupportedKeyAlgorithm(format!(
                "EC curve {curve}"
            ))),
            Err(_) => Err(SignerError::InvalidKey(
                "EC key without named curve".to_string(),
            )),
        }
    }

    /// Decode a PEM `PRIVATE KEY` block.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, SignerError> {
        let block = pem::parse(pem).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        if block.tag() != "PRIVATE KEY" {
            return Err(SignerError::InvalidKey(format!(
                "expected a PRIVATE KEY block, found {}",
                block.tag()
            )));
        }
        Self::from_pkcs8_der(block.contents())
    }

    /// The key type.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::P256(_) | Self::P384(_) => KeyType::Ec,
        }
    }

    /// DER-encoded `SubjectPublicKeyInfo` of the matching public key.
    pub(crate) fn public_key_info(&self) -> Result<Vec<u8>, SignerError> {
        let doc = match self {
            Self::Rsa(key) => RsaPublicKey::from(key.as_ref()).to_public_key_der(),
            Self::P256(key) => key.verifying_key().to_public_key_der(),
            Self::P384(key) => key.verifying_key().to_public_key_der(),
        }
        .map_err(|e| SignerError::InternalError(e.to_string()))?;

        Ok(doc.as_bytes().to_vec())
    }

    /// Sign an already computed digest.
    pub(crate) fn sign_prehash(
        &self,
        alg: SignatureAlgorithm,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, SignerError> {
        let failed = |e: String| SignerError::InternalError(format!("signing failed: {e}"));

        match (self, alg) {
            (Self::Rsa(key), SignatureAlgorithm::RsaPkcs1v15) => {
                let scheme = match digest_algorithm {
                    DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
                    DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
                    DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
                    DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
                };
                key.sign(scheme, digest).map_err(|e| failed(e.to_string()))
            }

            (Self::Rsa(key), SignatureAlgorithm::RsaPss) => {
                let scheme = match digest_algorithm {
                    DigestAlgorithm::Sha1 => Pss::new::<Sha1>(),
                    DigestAlgorithm::Sha256 => Pss::new::<Sha256>(),
                    DigestAlgorithm::Sha384 => Pss::new::<Sha384>(),
                    DigestAlgorithm::Sha512 => Pss::new::<Sha512>(),
                };
                key.sign_with_rng(&mut rand::thread_rng(), scheme, digest)
                    .map_err(|e| failed(e.to_string()))
            }

            (Self::P256(key), SignatureAlgorithm::Ecdsa) => {
                let sig: p256::ecdsa::Signature =
                    key.sign_prehash(digest).map_err(|e| failed(e.to_string()))?;
                Ok(sig.to_der().as_bytes().to_vec())
            }

            (Self::P384(key), SignatureAlgorithm::Ecdsa) => {
                let sig: p384::ecdsa::Signature =
                    key.sign_prehash(digest).map_err(|e| failed(e.to_string()))?;
                Ok(sig.to_der().as_bytes().to_vec())
            }

            (key, alg) => Err(SignerError::UnsupportedKeyAlgorithm(format!(
                "{alg} cannot be used with an {:?} key",
                key.key_type()
            ))),
        }
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Rsa(Box::new(key))
    }
}

impl From<p256::ecdsa::SigningKey> for PrivateKey {
    fn from(key: p256::ecdsa::SigningKey) -> Self {
        Self::P256(key)
    }
}

impl From<p384::ecdsa::SigningKey> for PrivateKey {
    fn from(key: p384::ecdsa::SigningKey) -> Self {
        Self::P384(key)
    }
}

/// Compare the key bits of two DER `SubjectPublicKeyInfo`s.
///
/// Algorithm parameters are ignored because encoders disagree on whether an
/// RSA key carries an explicit `NULL`.
pub(crate) fn same_public_key(a: &[u8], b: &[u8]) -> Result<bool, SignerError> {
    fn parse(der: &[u8]) -> Result<SubjectPublicKeyInfoRef<'_>, SignerError> {
        SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| SignerError::InternalError(format!("invalid public key: {e}")))
    }

    let (a, b) = (parse(a)?, parse(b)?);

    Ok(a.algorithm.oid == b.algorithm.oid
        && a.subject_public_key.raw_bytes() == b.subject_public_key.raw_bytes())
}

/// A [`Signer`] backed by a [`PrivateKey`] and its certificate.
pub struct PrivateKeySigner {
    key: PrivateKey,
    algorithm: SignatureAlgorithm,
    certificate: Vec<u8>,
    chain: Vec<Vec<u8>>,
}

impl PrivateKeySigner {
    /// Pair `key` with its DER-encoded `certificate` and the certificates
    /// above it.
    ///
    /// RSA keys default to PKCS#1 v1.5; see [`PrivateKeySigner::with_rsa_pss`].
    /// Returns [`SignerError::KeyMismatch`] when the certificate was issued
    /// for a different key.
    pub fn new(
        key: impl Into<PrivateKey>,
        certificate: Vec<u8>,
        chain: Vec<Vec<u8>>,
    ) -> Result<Self, SignerError> {
        let key = key.into();

        let cert = Certificate::from_der(&certificate)
            .map_err(|e| SignerError::InvalidCertificate(e.to_string()))?;

        if !same_public_key(&key.public_key_info()?, cert.subject_public_key_info())? {
            return Err(SignerError::KeyMismatch);
        }

        let algorithm = match key.key_type() {
            KeyType::Rsa => SignatureAlgorithm::RsaPkcs1v15,
            KeyType::Ec => SignatureAlgorithm::Ecdsa,
        };

        Ok(Self {
            key,
            algorithm,
            certificate,
            chain,
        })
    }

    /// Load a DER PKCS#8 key. See [`PrivateKeySigner::new`].
    pub fn from_pkcs8_der(
        key_der: &[u8],
        certificate: Vec<u8>,
        chain: Vec<Vec<u8>>,
    ) -> Result<Self, SignerError> {
        Self::new(PrivateKey::from_pkcs8_der(key_der)?, certificate, chain)
    }

    /// Load a PEM PKCS#8 key. See [`PrivateKeySigner::new`].
    pub fn from_pkcs8_pem(
        key_pem: &str,
        certificate: Vec<u8>,
        chain: Vec<Vec<u8>>,
    ) -> Result<Self, SignerError> {
        Self::new(PrivateKey::from_pkcs8_pem(key_pem)?, certificate, chain)
    }

    /// Sign with RSASSA-PSS instead of PKCS#1 v1.5.
    pub fn with_rsa_pss(mut self) -> Result<Self, SignerError> {
        if self.key.key_type() != KeyType::Rsa {
            return Err(SignerError::UnsupportedKeyAlgorithm(
                "RSASSA-PSS requires an RSA key".to_string(),
            ));
        }
        self.algorithm = SignatureAlgorithm::RsaPss;
        Ok(self)
    }
}

#[async_trait]
impl Signer for PrivateKeySigner {
    fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    fn key_type(&self) -> KeyType {
        self.key.key_type()
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    async fn sign(
        &self,
        data: &[u8],
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Vec<u8>, SignerError> {
        let digest = digest_algorithm.digest(data);
        self.key.sign_prehash(self.algorithm, digest_algorithm, &digest)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used)]

    use ecdsa::signature::Verifier;
    use rsa::traits::PublicKeyParts;
    use sha2::Digest;

    use super::*;
    use crate::tests::fixtures::TestPki;

    #[tokio::test]
    async fn rsa_pkcs1_signature_verifies() {
        let pki = TestPki::rsa("http://localhost");
        let signer = pki.leaf_signer();

        assert_eq!(signer.key_type(), KeyType::Rsa);
        assert_eq!(signer.signature_algorithm(), SignatureAlgorithm::RsaPkcs1v15);

        let sig = signer.sign(b"attributes", DigestAlgorithm::Sha256).await.unwrap();

        let PrivateKey::Rsa(key) = &pki.leaf.key else {
            panic!("leaf key should be RSA");
        };
        let public = RsaPublicKey::from(key.as_ref());
        assert_eq!(sig.len(), public.size());

        public
            .verify(
                Pkcs1v15Sign::new::<Sha256>(),
                &Sha256::digest(b"attributes"),
                &sig,
            )
            .unwrap();
    }

    #[tokio::test]
    async fn rsa_pss_signature_verifies() {
        let pki = TestPki::rsa("http://localhost");
        let signer = pki.leaf_signer().with_rsa_pss().unwrap();

        let sig = signer.sign(b"attributes", DigestAlgorithm::Sha384).await.unwrap();

        let PrivateKey::Rsa(key) = &pki.leaf.key else {
            panic!("leaf key should be RSA");
        };
        RsaPublicKey::from(key.as_ref())
            .verify(Pss::new::<Sha384>(), &Sha384::digest(b"attributes"), &sig)
            .unwrap();
    }

    #[tokio::test]
    async fn p256_signature_is_der() {
        let pki = TestPki::ec("http://localhost");
        let signer = pki.leaf_signer();

        assert_eq!(signer.key_type(), KeyType::Ec);
        let sig = signer.sign(b"attributes", DigestAlgorithm::Sha256).await.unwrap();

        let PrivateKey::P256(key) = &pki.leaf.key else {
            panic!("leaf key should be P-256");
        };
        let sig = p256::ecdsa::Signature::from_der(&sig).unwrap();
        key.verifying_key().verify(b"attributes", &sig).unwrap();
    }

    #[test]
    fn certificate_for_another_key_is_rejected() {
        let pki = TestPki::rsa("http://localhost");
        let key = PrivateKey::from_pkcs8_der(&pki.leaf.pkcs8()).unwrap();

        assert!(matches!(
            PrivateKeySigner::new(key, pki.intermediate.der.clone(), vec![]),
            Err(SignerError::KeyMismatch)
        ));
    }

    #[test]
    fn ecdsa_key_cannot_use_pss() {
        let pki = TestPki::ec("http://localhost");
        assert!(matches!(
            pki.leaf_signer().with_rsa_pss(),
            Err(SignerError::UnsupportedKeyAlgorithm(_))
        ));
    }

    #[test]
    fn pem_keys_load() {
        let pki = TestPki::ec("http://localhost");
        let pem = pem::encode(&pem::Pem::new("PRIVATE KEY", pki.leaf.pkcs8()));

        let signer = PrivateKeySigner::from_pkcs8_pem(&pem, pki.leaf.der.clone(), vec![]).unwrap();
        assert_eq!(signer.certificate(), pki.leaf.der.as_slice());

        let wrong_tag = pem::encode(&pem::Pem::new("CERTIFICATE", pki.leaf.der.clone()));
        assert!(matches!(
            PrivateKey::from_pkcs8_pem(&wrong_tag),
            Err(SignerError::InvalidKey(_))
        ));
    }

    #[test]
    fn rsa_modulus_survives_pkcs8() {
        let pki = TestPki::rsa("http://localhost");
        let PrivateKey::Rsa(original) = &pki.leaf.key else {
            panic!("leaf key should be RSA");
        };
        let PrivateKey::Rsa(decoded) = PrivateKey::from_pkcs8_der(&pki.leaf.pkcs8()).unwrap()
        else {
            panic!("decoded key should be RSA");
        };
        assert_eq!(original.n(), decoded.n());
    }
}
