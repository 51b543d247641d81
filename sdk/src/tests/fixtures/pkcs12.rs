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

//! Builds PKCS#12 stores the way common tools write them: certificates in
//! an encrypted safe, the key in a shrouded key bag, and an HMAC over the
//! authenticated safe.

use rand::RngCore;
use rasn::{prelude::*, types::Oid};
use rasn_pkix::AlgorithmIdentifier;

use super::{der, BagEncryption, TestCert};
use crate::crypto::{
    asn1::{
        oids,
        pkcs12::{
            CertBag, DigestInfo, EncryptedContentInfo, EncryptedData, EncryptedPrivateKeyInfo,
            MacData, Pbes2Params, Pbkdf2Params, Pfx, Pkcs12PbeParams, SafeBag,
        },
        ContentInfo,
    },
    hash::DigestAlgorithm,
    raw_signature::{cipher::Cipher, kdf},
};

const ITERATIONS: u32 = 2048;

pub(crate) struct Pkcs12Builder<'a> {
    leaf: &'a TestCert,
    others: Vec<&'a TestCert>,
    encryption: BagEncryption,
    include_key: bool,
}

impl<'a> Pkcs12Builder<'a> {
    pub(crate) fn new(leaf: &'a TestCert, others: &[&'a TestCert]) -> Self {
        Self {
            leaf,
            others: others.to_vec(),
            encryption: BagEncryption::default(),
            include_key: true,
        }
    }

    pub(crate) fn encryption(mut self, encryption: BagEncryption) -> Self {
        self.encryption = encryption;
        self
    }

    pub(crate) fn without_key(mut self) -> Self {
        self.include_key = false;
        self
    }

    pub(crate) fn build(self, password: &str) -> Vec<u8> {
        let mut safes = vec![self.certificate_safe(password)];
        if self.include_key {
            safes.push(self.key_safe(password));
        }

        let auth_safe = der(&safes);
        let mac_salt = random(8);
        let mac = kdf::compute_mac(
            DigestAlgorithm::Sha256,
            &kdf::bmp_password(password),
            &mac_salt,
            ITERATIONS,
            &auth_safe,
        );

        der(&Pfx {
            version: 3,
            auth_safe: data_content(auth_safe),
            mac_data: Some(MacData {
                mac: DigestInfo {
                    digest_algorithm: DigestAlgorithm::Sha256.algorithm_identifier(),
                    digest: OctetString::from(mac),
                },
                mac_salt: OctetString::from(mac_salt),
                iterations: Some(ITERATIONS),
            }),
        })
    }

    fn certificate_safe(&self, password: &str) -> ContentInfo {
        let bags: Vec<SafeBag> = std::iter::once(self.leaf)
            .chain(self.others.iter().copied())
            .map(|cert| SafeBag {
                bag_id: ObjectIdentifier::from(oids::CERT_BAG),
                bag_value: Any::new(der(&CertBag {
                    cert_id: ObjectIdentifier::from(oids::X509_CERTIFICATE),
                    cert_value: Any::new(der(&OctetString::from(cert.der.clone()))),
                })),
                bag_attributes: None,
            })
            .collect();

        let algorithm = self.algorithm();
        let sealed = Cipher::from_algorithm(&algorithm, password)
            .unwrap()
            .encrypt(&der(&bags))
            .unwrap();

        ContentInfo {
            content_type: ObjectIdentifier::from(oids::ID_ENCRYPTED_DATA),
            content: Any::new(der(&EncryptedData {
                version: 0,
                encrypted_content_info: EncryptedContentInfo {
                    content_type: ObjectIdentifier::from(oids::ID_DATA),
                    content_encryption_algorithm: algorithm,
                    encrypted_content: Some(OctetString::from(sealed)),
                },
            })),
        }
    }

    fn key_safe(&self, password: &str) -> ContentInfo {
        let algorithm = self.algorithm();
        let sealed = Cipher::from_algorithm(&algorithm, password)
            .unwrap()
            .encrypt(&self.leaf.pkcs8())
            .unwrap();

        let bags = vec![SafeBag {
            bag_id: ObjectIdentifier::from(oids::PKCS8_SHROUDED_KEY_BAG),
            bag_value: Any::new(der(&EncryptedPrivateKeyInfo {
                encryption_algorithm: algorithm,
                encrypted_data: OctetString::from(sealed),
            })),
            bag_attributes: None,
        }];

        data_content(der(&bags))
    }

    fn algorithm(&self) -> AlgorithmIdentifier {
        let legacy = |oid: &'static Oid| AlgorithmIdentifier {
            algorithm: ObjectIdentifier::from(oid),
            parameters: Some(Any::new(der(&Pkcs12PbeParams {
                salt: OctetString::from(random(8)),
                iterations: ITERATIONS,
            }))),
        };

        match self.encryption {
            BagEncryption::TripleDes => legacy(oids::PBE_SHA_3DES),
            BagEncryption::Rc2_40 => legacy(oids::PBE_SHA_RC2_40),
            BagEncryption::Aes256 => {
                let kdf = Pbkdf2Params {
                    salt: OctetString::from(random(16)),
                    iteration_count: ITERATIONS,
                    key_length: None,
                    prf: Some(AlgorithmIdentifier {
                        algorithm: ObjectIdentifier::from(oids::HMAC_SHA256),
                        parameters: Some(Any::new(vec![0x05, 0x00])),
                    }),
                };

                let params = Pbes2Params {
                    key_derivation_func: AlgorithmIdentifier {
                        algorithm: ObjectIdentifier::from(oids::PBKDF2),
                        parameters: Some(Any::new(der(&kdf))),
                    },
                    encryption_scheme: AlgorithmIdentifier {
                        algorithm: ObjectIdentifier::from(oids::AES256_CBC),
                        parameters: Some(Any::new(der(&OctetString::from(random(16))))),
                    },
                };

                AlgorithmIdentifier {
                    algorithm: ObjectIdentifier::from(oids::PBES2),
                    parameters: Some(Any::new(der(&params))),
                }
            }
        }
    }
}

fn data_content(data: Vec<u8>) -> ContentInfo {
    ContentInfo {
        content_type: ObjectIdentifier::from(oids::ID_DATA),
        content: Any::new(der(&OctetString::from(data))),
    }
}

fn random(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
