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

//! Signing credentials loaded from a PKCS#12 (`.p12` / `.pfx`) key store.

pub(crate) mod cipher;
pub(crate) mod kdf;

use async_trait::async_trait;
use rasn::types::{ObjectIdentifier, OctetString};

use self::cipher::Cipher;
use super::{
    key_signer::{same_public_key, PrivateKey},
    KeyType, PrivateKeySigner, SignatureAlgorithm, Signer, SignerError,
};
use crate::{
    certificate::Certificate,
    crypto::{
        asn1::{
            oids,
            pkcs12::{
                AuthenticatedSafe, CertBag, EncryptedData, EncryptedPrivateKeyInfo, MacData, Pfx,
                SafeBag, SafeContents,
            },
            ContentInfo,
        },
        hash::DigestAlgorithm,
    },
};

/// A [`Signer`] whose key and certificates come from a PKCS#12 key store.
pub struct Pkcs12Signer {
    inner: PrivateKeySigner,
}

impl Pkcs12Signer {
    /// Open a PKCS#12 key store with `password`.
    ///
    /// The MAC is checked before anything is decrypted, so a wrong password
    /// is reported as [`SignerError::InvalidCredentials`] rather than as a
    /// parse failure. The signing certificate is the one whose public key
    /// matches the private key; the remaining certificates become the chain,
    /// issuer first.
    pub fn from_pkcs12(data: &[u8], password: &str) -> Result<Self, SignerError> {
        let contents = Pkcs12Contents::parse(data, password)?;

        let key = contents
            .keys
            .into_iter()
            .next()
            .ok_or(SignerError::NoPrivateKey)?;
        let key = PrivateKey::from_pkcs8_der(&key)?;
        let public_key = key.public_key_info()?;

        let mut certs = Vec::with_capacity(contents.certificates.len());
        for der in contents.certificates {
            let cert = Certificate::from_der(&der)
                .map_err(|e| SignerError::InvalidPkcs12(e.to_string()))?;
            certs.push(cert);
        }

        let mut leaf_index = None;
        for (i, cert) in certs.iter().enumerate() {
            if same_public_key(&public_key, cert.subject_public_key_info())? {
                leaf_index = Some(i);
                break;
            }
        }
        let leaf = certs.remove(leaf_index.ok_or(SignerError::NoCertificate)?);

        let chain = order_chain(&leaf, certs);

        log::debug!(
            "loaded PKCS#12 signer {:?} with {} chain certificate(s)",
            key.key_type(),
            chain.len()
        );

        Ok(Self {
            inner: PrivateKeySigner::new(key, leaf.der().to_vec(), chain)?,
        })
    }

    /// Sign with RSASSA-PSS instead of PKCS#1 v1.5.
    pub fn with_rsa_pss(self) -> Result<Self, SignerError> {
        Ok(Self {
            inner: self.inner.with_rsa_pss()?,
        })
    }
}

#[async_trait]
impl Signer for Pkcs12Signer {
    fn certificate(&self) -> &[u8] {
        self.inner.certificate()
    }

    fn certificate_chain(&self) -> &[Vec<u8>] {
        self.inner.certificate_chain()
    }

    fn key_type(&self) -> KeyType {
        self.inner.key_type()
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.inner.signature_algorithm()
    }

    async fn sign(
        &self,
        data: &[u8],
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Vec<u8>, SignerError> {
        self.inner.sign(data, digest_algorithm).await
    }
}

// Issuer first, then its issuer, and so on. Certificates that do not fit
// the path are kept at the end in their original order.
fn order_chain(leaf: &Certificate, mut rest: Vec<Certificate>) -> Vec<Vec<u8>> {
    let mut chain = Vec::with_capacity(rest.len());
    let mut current = leaf.clone();

    while !current.is_self_signed() {
        let Some(pos) = rest.iter().position(|c| current.is_issued_by(c)) else {
            break;
        };
        current = rest.remove(pos);
        chain.push(current.der().to_vec());
    }

    chain.extend(rest.into_iter().map(|c| c.der().to_vec()));
    chain
}

#[derive(Debug, Default)]
struct Pkcs12Contents {
    keys: Vec<Vec<u8>>,
    certificates: Vec<Vec<u8>>,
}

fn invalid(e: impl std::fmt::Display) -> SignerError {
    SignerError::InvalidPkcs12(e.to_string())
}

fn is(oid: &ObjectIdentifier, expected: &'static rasn::types::Oid) -> bool {
    oid == &ObjectIdentifier::from(expected)
}

impl Pkcs12Contents {
    fn parse(data: &[u8], password: &str) -> Result<Self, SignerError> {
        let pfx: Pfx = rasn::ber::decode(data).map_err(invalid)?;
        if pfx.version != 3 {
            return Err(invalid(format!("unsupported PFX version {}", pfx.version)));
        }

        if !is(&pfx.auth_safe.content_type, oids::ID_DATA) {
            return Err(SignerError::UnsupportedEncryption(format!(
                "public-key integrity mode ({})",
                pfx.auth_safe.content_type
            )));
        }

        let auth_safe: OctetString =
            rasn::ber::decode(pfx.auth_safe.content.as_bytes()).map_err(invalid)?;

        match &pfx.mac_data {
            Some(mac_data) => verify_mac(mac_data, password, &auth_safe)?,
            None => log::warn!("PKCS#12 key store has no MAC; integrity not verified"),
        }

        let safes: AuthenticatedSafe = rasn::ber::decode(&auth_safe).map_err(invalid)?;

        let mut contents = Self::default();
        for safe in &safes {
            let bags = contents_of(safe, password)?;
            for bag in &bags {
                contents.add_bag(bag, password)?;
            }
        }

        Ok(contents)
    }

    fn add_bag(&mut self, bag: &SafeBag, password: &str) -> Result<(), SignerError> {
        let value = bag.bag_value.as_bytes();

        if is(&bag.bag_id, oids::KEY_BAG) {
            self.keys.push(value.to_vec());
        } else if is(&bag.bag_id, oids::PKCS8_SHROUDED_KEY_BAG) {
            let info: EncryptedPrivateKeyInfo = rasn::ber::decode(value).map_err(invalid)?;
            let key = Cipher::from_algorithm(&info.encryption_algorithm, password)?
                .decrypt(&info.encrypted_data)?;
            self.keys.push(key);
        } else if is(&bag.bag_id, oids::CERT_BAG) {
            let cert_bag: CertBag = rasn::ber::decode(value).map_err(invalid)?;
            if !is(&cert_bag.cert_id, oids::X509_CERTIFICATE) {
                log::debug!("skipping certificate bag of type {}", cert_bag.cert_id);
                return Ok(());
            }
            let der: OctetString =
                rasn::ber::decode(cert_bag.cert_value.as_bytes()).map_err(invalid)?;
            self.certificates.push(der.to_vec());
        } else {
            log::debug!("skipping PKCS#12 bag of type {}", bag.bag_id);
        }

        Ok(())
    }
}

fn contents_of(safe: &ContentInfo, password: &str) -> Result<SafeContents, SignerError> {
    let content = safe.content.as_bytes();

    if is(&safe.content_type, oids::ID_DATA) {
        let data: OctetString = rasn::ber::decode(content).map_err(invalid)?;
        return rasn::ber::decode(&data).map_err(invalid);
    }

    if is(&safe.content_type, oids::ID_ENCRYPTED_DATA) {
        let encrypted: EncryptedData = rasn::ber::decode(content).map_err(invalid)?;
        let info = encrypted.encrypted_content_info;
        let sealed = info
            .encrypted_content
            .ok_or_else(|| invalid("encrypted safe has no content"))?;

        let plain =
            Cipher::from_algorithm(&info.content_encryption_algorithm, password)?.decrypt(&sealed)?;
        return rasn::ber::decode(&plain).map_err(invalid);
    }

    Err(SignerError::UnsupportedEncryption(format!(
        "safe content type {}",
        safe.content_type
    )))
}

fn verify_mac(mac_data: &MacData, password: &str, data: &[u8]) -> Result<(), SignerError> {
    let alg = DigestAlgorithm::from_oid(&mac_data.mac.digest_algorithm.algorithm).ok_or_else(
        || {
            SignerError::UnsupportedEncryption(format!(
                "MAC digest {}",
                mac_data.mac.digest_algorithm.algorithm
            ))
        },
    )?;
    let iterations = mac_data.iterations.unwrap_or(1);
    let expected = mac_data.mac.digest.as_ref();

    let mut candidates = vec![kdf::bmp_password(password)];
    // Some writers encode an empty password as zero bytes instead of a NUL.
    if password.is_empty() {
        candidates.push(Vec::new());
    }

    let matched = candidates.iter().any(|candidate| {
        kdf::compute_mac(alg, candidate, &mac_data.mac_salt, iterations, data) == expected
    });

    if matched {
        Ok(())
    } else {
        Err(SignerError::InvalidCredentials)
    }
}
