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

//! Password-based decryption of PKCS#12 bags.
//!
//! PBES2 is handled with PBKDF2 and AES or DES-EDE3. The legacy
//! `pbeWithSHAAnd*` schemes derive their key and IV with the PKCS#12 KDF.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, InnerIvInit, KeyInit,
};
use des::{TdesEde2, TdesEde3};
use rasn::types::{ObjectIdentifier, OctetString};
use rasn_pkix::AlgorithmIdentifier;
use rc2::Rc2;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use super::kdf::{self, KdfPurpose};
use crate::crypto::{
    asn1::{
        oids,
        pkcs12::{Pbes2Params, Pbkdf2Params, Pkcs12PbeParams},
    },
    hash::DigestAlgorithm,
    raw_signature::SignerError,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Algorithm {
    Aes128,
    Aes192,
    Aes256,
    DesEde3,
    DesEde2,
    Rc2 { effective_bits: usize },
}

impl Algorithm {
    fn key_len(&self) -> usize {
        match self {
            Self::Aes128 | Self::DesEde2 => 16,
            Self::Aes192 | Self::DesEde3 => 24,
            Self::Aes256 => 32,
            Self::Rc2 { effective_bits } => effective_bits / 8,
        }
    }

    fn iv_len(&self) -> usize {
        match self {
            Self::Aes128 | Self::Aes192 | Self::Aes256 => 16,
            Self::DesEde3 | Self::DesEde2 | Self::Rc2 { .. } => 8,
        }
    }
}

/// A block cipher in CBC mode with its key and IV, ready to use.
#[derive(Debug)]
pub(crate) struct Cipher {
    algorithm: Algorithm,
    key: Vec<u8>,
    iv: Vec<u8>,
}

fn parameters<T: rasn::Decode>(alg: &AlgorithmIdentifier) -> Result<T, SignerError> {
    let params = alg.parameters.as_ref().ok_or_else(|| {
        SignerError::InvalidPkcs12(format!("missing parameters for {}", alg.algorithm))
    })?;

    rasn::ber::decode(params.as_bytes()).map_err(|e| {
        SignerError::InvalidPkcs12(format!("bad parameters for {}: {e}", alg.algorithm))
    })
}

impl Cipher {
    /// Derive the key and IV described by `alg` from `password`.
    pub(crate) fn from_algorithm(
        alg: &AlgorithmIdentifier,
        password: &str,
    ) -> Result<Self, SignerError> {
        let legacy = match &alg.algorithm {
            oid if oid == &ObjectIdentifier::from(oids::PBES2) => {
                return Self::pbes2(parameters(alg)?, password);
            }
            oid if oid == &ObjectIdentifier::from(oids::PBE_SHA_3DES) => Algorithm::DesEde3,
            oid if oid == &ObjectIdentifier::from(oids::PBE_SHA_2DES) => Algorithm::DesEde2,
            oid if oid == &ObjectIdentifier::from(oids::PBE_SHA_RC2_128) => {
                Algorithm::Rc2 { effective_bits: 128 }
            }
            oid if oid == &ObjectIdentifier::from(oids::PBE_SHA_RC2_40) => {
                Algorithm::Rc2 { effective_bits: 40 }
            }
            oid => return Err(SignerError::UnsupportedEncryption(oid.to_string())),
        };

        let params: Pkcs12PbeParams = parameters(alg)?;
        let password = kdf::bmp_password(password);

        let derive = |purpose, len| {
            kdf::derive(
                DigestAlgorithm::Sha1,
                &password,
                &params.salt,
                params.iterations,
                purpose,
                len,
            )
        };

        Ok(Self {
            algorithm: legacy,
            key: derive(KdfPurpose::Key, legacy.key_len()),
            iv: derive(KdfPurpose::Iv, legacy.iv_len()),
        })
    }

    fn pbes2(params: Pbes2Params, password: &str) -> Result<Self, SignerError> {
        let kdf_alg = &params.key_derivation_func;
        if kdf_alg.algorithm != ObjectIdentifier::from(oids::PBKDF2) {
            return Err(SignerError::UnsupportedEncryption(format!(
                "PBES2 key derivation {}",
                kdf_alg.algorithm
            )));
        }
        let kdf_params: Pbkdf2Params = parameters(kdf_alg)?;

        let scheme = &params.encryption_scheme;
        let algorithm = match &scheme.algorithm {
            oid if oid == &ObjectIdentifier::from(oids::AES128_CBC) => Algorithm::Aes128,
            oid if oid == &ObjectIdentifier::from(oids::AES192_CBC) => Algorithm::Aes192,
            oid if oid == &ObjectIdentifier::from(oids::AES256_CBC) => Algorithm::Aes256,
            oid if oid == &ObjectIdentifier::from(oids::DES_EDE3_CBC) => Algorithm::DesEde3,
            oid => {
                return Err(SignerError::UnsupportedEncryption(format!(
                    "PBES2 cipher {oid}"
                )))
            }
        };

        let iv: OctetString = parameters(scheme)?;
        if iv.len() != algorithm.iv_len() {
            return Err(SignerError::InvalidPkcs12(format!(
                "IV is {} bytes, expected {}",
                iv.len(),
                algorithm.iv_len()
            )));
        }

        let mut key = vec![0u8; algorithm.key_len()];
        let salt = kdf_params.salt.as_ref();
        let rounds = kdf_params.iteration_count;
        let password = password.as_bytes();

        let prf = kdf_params
            .prf
            .as_ref()
            .map(|prf| prf.algorithm.clone())
            .unwrap_or_else(|| ObjectIdentifier::from(oids::HMAC_SHA1));

        match &prf {
            oid if oid == &ObjectIdentifier::from(oids::HMAC_SHA1) => {
                pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, rounds, &mut key)
            }
            oid if oid == &ObjectIdentifier::from(oids::HMAC_SHA256) => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key)
            }
            oid if oid == &ObjectIdentifier::from(oids::HMAC_SHA384) => {
                pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, rounds, &mut key)
            }
            oid if oid == &ObjectIdentifier::from(oids::HMAC_SHA512) => {
                pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, &mut key)
            }
            oid => {
                return Err(SignerError::UnsupportedEncryption(format!(
                    "PBKDF2 PRF {oid}"
                )))
            }
        }

        Ok(Self {
            algorithm,
            key,
            iv: iv.to_vec(),
        })
    }

    /// Decrypt and strip PKCS#7 padding.
    ///
    /// Bad padding means the key was wrong and is reported as
    /// [`SignerError::InvalidCredentials`].
    pub(crate) fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        match self.algorithm {
            Algorithm::Aes128 => cbc_decrypt(new_cipher::<Aes128>(&self.key)?, &self.iv, data),
            Algorithm::Aes192 => cbc_decrypt(new_cipher::<Aes192>(&self.key)?, &self.iv, data),
            Algorithm::Aes256 => cbc_decrypt(new_cipher::<Aes256>(&self.key)?, &self.iv, data),
            Algorithm::DesEde3 => {
                cbc_decrypt(new_cipher::<TdesEde3>(&self.key)?, &self.iv, data)
            }
            Algorithm::DesEde2 => {
                cbc_decrypt(new_cipher::<TdesEde2>(&self.key)?, &self.iv, data)
            }
            Algorithm::Rc2 { effective_bits } => cbc_decrypt(
                Rc2::new_with_eff_key_len(&self.key, effective_bits),
                &self.iv,
                data,
            ),
        }
    }

    /// Encrypt with PKCS#7 padding.
    #[cfg(test)]
    pub(crate) fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        match self.algorithm {
            Algorithm::Aes128 => cbc_encrypt(new_cipher::<Aes128>(&self.key)?, &self.iv, data),
            Algorithm::Aes192 => cbc_encrypt(new_cipher::<Aes192>(&self.key)?, &self.iv, data),
            Algorithm::Aes256 => cbc_encrypt(new_cipher::<Aes256>(&self.key)?, &self.iv, data),
            Algorithm::DesEde3 => {
                cbc_encrypt(new_cipher::<TdesEde3>(&self.key)?, &self.iv, data)
            }
            Algorithm::DesEde2 => {
                cbc_encrypt(new_cipher::<TdesEde2>(&self.key)?, &self.iv, data)
            }
            Algorithm::Rc2 { effective_bits } => cbc_encrypt(
                Rc2::new_with_eff_key_len(&self.key, effective_bits),
                &self.iv,
                data,
            ),
        }
    }
}

fn new_cipher<C: KeyInit>(key: &[u8]) -> Result<C, SignerError> {
    C::new_from_slice(key)
        .map_err(|_| SignerError::InternalError(format!("invalid key length {}", key.len())))
}

fn cbc_decrypt<C: BlockCipher + BlockDecryptMut>(
    cipher: C,
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, SignerError> {
    cbc::Decryptor::<C>::inner_iv_slice_init(cipher, iv)
        .map_err(|_| SignerError::InvalidPkcs12(format!("invalid IV length {}", iv.len())))?
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| SignerError::InvalidCredentials)
}

#[cfg(test)]
fn cbc_encrypt<C: BlockCipher + cbc::cipher::BlockEncryptMut>(
    cipher: C,
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, SignerError> {
    use cbc::cipher::BlockEncryptMut;

    Ok(cbc::Encryptor::<C>::inner_iv_slice_init(cipher, iv)
        .map_err(|_| SignerError::InvalidPkcs12(format!("invalid IV length {}", iv.len())))?
        .encrypt_padded_vec_mut::<Pkcs7>(data))
}
