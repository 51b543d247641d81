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

//! Test PKI, PDF and protocol fixtures.
//!
//! A [`TestPki`] is a root, an intermediate, a signer and a TSA certificate.
//! Their AIA and CRL distribution point extensions point below a base URL,
//! usually a mock server:
//!
//! | certificate   | caIssuers           | OCSP    | CRL                 |
//! |---------------|---------------------|---------|---------------------|
//! | `root`        |                     |         |                     |
//! | `intermediate`| `/root.cer`         |         | `/root.crl`         |
//! | `leaf`, `tsa` | `/intermediate.cer` | `/ocsp` | `/intermediate.crl` |

pub(crate) mod ocsp;
pub(crate) mod pkcs12;
pub(crate) mod tsa;

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Timelike, Utc};
use httpmock::{Method, Mock, MockServer};
use pkcs8::EncodePrivateKey;
use rasn::{prelude::*, types::Oid};
use rasn_pkix::{
    AlgorithmIdentifier, AttributeTypeAndValue, AuthorityKeyIdentifier, BasicConstraints,
    Certificate, Extension, Extensions, Name, RelativeDistinguishedName, SubjectPublicKeyInfo,
    TbsCertificate, Time, Validity, Version,
};
use rsa::RsaPrivateKey;

use crate::{
    cms::encode_signed_data,
    crypto::{
        asn1::{
            oids,
            rfc5652::{EncapsulatedContentInfo, SignedData},
        },
        hash::{sha1, DigestAlgorithm},
        ocsp::make_ocsp_cert_id,
        raw_signature::{
            signature_algorithm_identifier, KeyType, PrivateKey, PrivateKeySigner,
            SignatureAlgorithm,
        },
    },
    pdf::{byte_range_placeholder, contents_placeholder},
    settings::Settings,
};

const COMMON_NAME: &Oid = Oid::const_new(&[2, 5, 4, 3]);
const ORGANIZATION: &Oid = Oid::const_new(&[2, 5, 4, 10]);
const SUBJECT_KEY_ID: &Oid = Oid::const_new(&[2, 5, 29, 14]);
const KEY_USAGE: &Oid = Oid::const_new(&[2, 5, 29, 15]);
const BASIC_CONSTRAINTS: &Oid = Oid::const_new(&[2, 5, 29, 19]);
const CRL_DISTRIBUTION_POINTS: &Oid = Oid::const_new(&[2, 5, 29, 31]);
const AUTHORITY_KEY_ID: &Oid = Oid::const_new(&[2, 5, 29, 35]);
const EXT_KEY_USAGE: &Oid = Oid::const_new(&[2, 5, 29, 37]);
const AUTHORITY_INFO_ACCESS: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 1, 1]);
const KP_TIME_STAMPING: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 3, 8]);
const AD_OCSP: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1]);
const AD_CA_ISSUERS: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 2]);

/// How the bags of a generated PKCS#12 store are encrypted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum BagEncryption {
    /// PBES2 with PBKDF2-HMAC-SHA256 and AES-256-CBC.
    #[default]
    Aes256,

    /// `pbeWithSHAAnd3-KeyTripleDES-CBC`
    TripleDes,

    /// `pbeWithSHAAnd40BitRC2-CBC`
    Rc2_40,
}

/// A certificate and the private key it was issued for.
#[derive(Clone)]
pub(crate) struct TestCert {
    pub(crate) der: Vec<u8>,
    pub(crate) key: PrivateKey,
}

impl TestCert {
    /// The key as an unencrypted PKCS#8 document.
    pub(crate) fn pkcs8(&self) -> Vec<u8> {
        let doc = match &self.key {
            PrivateKey::Rsa(key) => key.to_pkcs8_der(),
            PrivateKey::P256(key) => key.to_pkcs8_der(),
            PrivateKey::P384(key) => key.to_pkcs8_der(),
        };
        doc.unwrap().as_bytes().to_vec()
    }

    pub(crate) fn certificate(&self) -> Certificate {
        rasn::der::decode(&self.der).unwrap()
    }

    /// Identifier of the algorithm [`TestCert::sign`] uses.
    pub(crate) fn signature_algorithm(&self) -> AlgorithmIdentifier {
        signature_algorithm_identifier(scheme(&self.key), DigestAlgorithm::Sha256).unwrap()
    }

    /// Sign `data` with SHA-256.
    pub(crate) fn sign(&self, data: &[u8]) -> Vec<u8> {
        sign(&self.key, data)
    }
}

pub(crate) struct TestPki {
    pub(crate) root: TestCert,
    pub(crate) intermediate: TestCert,
    pub(crate) leaf: TestCert,
    pub(crate) tsa: TestCert,
}

impl TestPki {
    /// RSA-2048 hierarchy under `base`. The keys are generated once per
    /// test binary.
    pub(crate) fn rsa(base: &str) -> Self {
        let [root, intermediate, leaf, tsa] = rsa_keys().clone().map(PrivateKey::from);
        Self::issue(base, root, intermediate, leaf, tsa)
    }

    /// P-256 hierarchy under `base`.
    pub(crate) fn ec(base: &str) -> Self {
        let key = || PrivateKey::from(p256::ecdsa::SigningKey::random(&mut rand::thread_rng()));
        Self::issue(base, key(), key(), key(), key())
    }

    /// Signer for the leaf certificate, with the intermediate as its chain.
    pub(crate) fn leaf_signer(&self) -> PrivateKeySigner {
        PrivateKeySigner::new(
            self.leaf.key.clone(),
            self.leaf.der.clone(),
            vec![self.intermediate.der.clone()],
        )
        .unwrap()
    }

    fn issue(
        base: &str,
        root_key: PrivateKey,
        intermediate_key: PrivateKey,
        leaf_key: PrivateKey,
        tsa_key: PrivateKey,
    ) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let base = base.trim_end_matches('/');

        let root = Template {
            serial: 1,
            subject: name("Test Root CA"),
            profile: Profile::Ca,
            ca_issuers: None,
            ocsp: None,
            crl: None,
        }
        .issue(root_key, None);

        let intermediate = Template {
            serial: 2,
            subject: name("Test Intermediate CA"),
            profile: Profile::Ca,
            ca_issuers: Some(format!("{base}/root.cer")),
            ocsp: None,
            crl: Some(format!("{base}/root.crl")),
        }
        .issue(intermediate_key, Some(&root));

        let leaf = Template {
            serial: 3,
            subject: name("Test Signer"),
            profile: Profile::Signer,
            ca_issuers: Some(format!("{base}/intermediate.cer")),
            ocsp: Some(format!("{base}/ocsp")),
            crl: Some(format!("{base}/intermediate.crl")),
        }
        .issue(leaf_key, Some(&intermediate));

        let tsa = Template {
            serial: 4,
            subject: name("Test Time Stamping Authority"),
            profile: Profile::TimeStamping,
            ca_issuers: Some(format!("{base}/intermediate.cer")),
            ocsp: Some(format!("{base}/ocsp")),
            crl: Some(format!("{base}/intermediate.crl")),
        }
        .issue(tsa_key, Some(&intermediate));

        Self {
            root,
            intermediate,
            leaf,
            tsa,
        }
    }
}

fn rsa_keys() -> &'static [RsaPrivateKey; 4] {
    static KEYS: OnceLock<[RsaPrivateKey; 4]> = OnceLock::new();

    KEYS.get_or_init(|| {
        std::array::from_fn(|_| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap())
    })
}

fn scheme(key: &PrivateKey) -> SignatureAlgorithm {
    match key.key_type() {
        KeyType::Rsa => SignatureAlgorithm::RsaPkcs1v15,
        KeyType::Ec => SignatureAlgorithm::Ecdsa,
    }
}

fn sign(key: &PrivateKey, data: &[u8]) -> Vec<u8> {
    let digest = DigestAlgorithm::Sha256.digest(data);
    key.sign_prehash(scheme(key), DigestAlgorithm::Sha256, &digest)
        .unwrap()
}

/// The current time, truncated to whole seconds.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now)
}

fn name(common_name: &str) -> Name {
    let rdn = |oid: &'static Oid, value: &str| {
        let value = PrintableString::try_from(value.to_string()).unwrap();
        let mut set = SetOf::new();
        set.insert(AttributeTypeAndValue {
            r#type: ObjectIdentifier::from(oid),
            value: Any::new(rasn::der::encode(&value).unwrap()),
        });
        RelativeDistinguishedName::from(set)
    };

    Name::RdnSequence(vec![
        rdn(COMMON_NAME, common_name),
        rdn(ORGANIZATION, "pades-ltv tests"),
    ])
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
#[rasn(choice)]
enum UriName {
    #[rasn(tag(6))]
    Uri(Ia5String),
}

impl UriName {
    fn new(uri: &str) -> Self {
        Self::Uri(Ia5String::try_from(uri.to_string()).unwrap())
    }
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
struct AccessDescription {
    access_method: ObjectIdentifier,
    access_location: UriName,
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
#[rasn(choice)]
enum DistributionPointName {
    #[rasn(tag(0))]
    FullName(SequenceOf<UriName>),
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
struct DistributionPoint {
    #[rasn(tag(explicit(0)))]
    distribution_point: Option<DistributionPointName>,
}

#[derive(Clone, Copy)]
enum Profile {
    Ca,
    Signer,
    TimeStamping,
}

struct Template {
    serial: i64,
    subject: Name,
    profile: Profile,
    ca_issuers: Option<String>,
    ocsp: Option<String>,
    crl: Option<String>,
}

fn extension(oid: &'static Oid, critical: bool, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: ObjectIdentifier::from(oid),
        critical,
        extn_value: OctetString::from(value),
    }
}

fn der<T: rasn::Encode>(value: &T) -> Vec<u8> {
    rasn::der::encode(value).unwrap()
}

impl Template {
    /// Issue the certificate, self-signed when `issuer` is `None`.
    fn issue(self, key: PrivateKey, issuer: Option<&TestCert>) -> TestCert {
        let spki_der = key.public_key_info().unwrap();
        let spki: SubjectPublicKeyInfo = rasn::der::decode(&spki_der).unwrap();
        let key_id = sha1(&spki_der);

        let (issuer_name, issuer_key_id, issuer_key) = match issuer {
            Some(issuer) => {
                let cert = issuer.certificate();
                let spki = der(&cert.tbs_certificate.subject_public_key_info);
                (cert.tbs_certificate.subject, sha1(&spki), &issuer.key)
            }
            None => (self.subject.clone(), key_id.clone(), &key),
        };

        let mut exts = match self.profile {
            Profile::Ca => vec![
                extension(
                    BASIC_CONSTRAINTS,
                    true,
                    der(&BasicConstraints {
                        ca: true,
                        path_len_constraint: None,
                    }),
                ),
                // keyCertSign, cRLSign, digitalSignature
                extension(KEY_USAGE, true, der(&BitString::from_slice(&[0x86]))),
            ],
            Profile::Signer | Profile::TimeStamping => vec![
                // SEQUENCE { BOOLEAN FALSE }
                extension(BASIC_CONSTRAINTS, true, vec![0x30, 0x03, 0x01, 0x01, 0x00]),
                // digitalSignature, nonRepudiation
                extension(KEY_USAGE, true, der(&BitString::from_slice(&[0xc0]))),
            ],
        };

        if matches!(self.profile, Profile::TimeStamping) {
            let eku = vec![ObjectIdentifier::from(KP_TIME_STAMPING)];
            exts.push(extension(EXT_KEY_USAGE, true, der(&eku)));
        }

        exts.push(extension(
            SUBJECT_KEY_ID,
            false,
            der(&OctetString::from(key_id)),
        ));

        if issuer.is_some() {
            let aki = AuthorityKeyIdentifier {
                key_identifier: Some(OctetString::from(issuer_key_id)),
                authority_cert_issuer: None,
                authority_cert_serial_number: None,
            };
            exts.push(extension(AUTHORITY_KEY_ID, false, der(&aki)));
        }

        let mut access = Vec::new();
        if let Some(url) = &self.ca_issuers {
            access.push(AccessDescription {
                access_method: ObjectIdentifier::from(AD_CA_ISSUERS),
                access_location: UriName::new(url),
            });
        }
        if let Some(url) = &self.ocsp {
            access.push(AccessDescription {
                access_method: ObjectIdentifier::from(AD_OCSP),
                access_location: UriName::new(url),
            });
        }
        if !access.is_empty() {
            exts.push(extension(AUTHORITY_INFO_ACCESS, false, der(&access)));
        }

        if let Some(url) = &self.crl {
            let points = vec![DistributionPoint {
                distribution_point: Some(DistributionPointName::FullName(vec![UriName::new(
                    url,
                )])),
            }];
            exts.push(extension(CRL_DISTRIBUTION_POINTS, false, der(&points)));
        }

        let now = now();
        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: Integer::from(self.serial),
            signature: signature_algorithm_identifier(scheme(issuer_key), DigestAlgorithm::Sha256)
                .unwrap(),
            issuer: issuer_name,
            validity: Validity {
                not_before: Time::Utc(now - Duration::days(1)),
                not_after: Time::Utc(now + Duration::days(365)),
            },
            subject: self.subject,
            subject_public_key_info: spki,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(Extensions::from(exts)),
        };

        let signature = sign(issuer_key, &der(&tbs));

        let cert = Certificate {
            signature_algorithm: tbs.signature.clone(),
            tbs_certificate: tbs,
            signature_value: BitString::from_slice(&signature),
        };

        TestCert {
            der: der(&cert),
            key,
        }
    }
}

#[derive(AsnType, Clone, Debug, Encode, PartialEq, Eq)]
struct TbsCertList {
    version: Option<u32>,
    signature: AlgorithmIdentifier,
    issuer: Name,
    this_update: Time,
    next_update: Option<Time>,
}

#[derive(AsnType, Clone, Debug, Encode, PartialEq, Eq)]
struct CertificateList {
    tbs_cert_list: TbsCertList,
    signature_algorithm: AlgorithmIdentifier,
    signature: BitString,
}

/// An empty v2 CRL signed by `issuer`.
pub(crate) fn crl(issuer: &TestCert) -> Vec<u8> {
    let now = now();
    let tbs_cert_list = TbsCertList {
        version: Some(1),
        signature: issuer.signature_algorithm(),
        issuer: issuer.certificate().tbs_certificate.subject,
        this_update: Time::Utc(now),
        next_update: Some(Time::Utc(now + Duration::days(7))),
    };

    let signature = issuer.sign(&der(&tbs_cert_list));

    der(&CertificateList {
        signature_algorithm: tbs_cert_list.signature.clone(),
        tbs_cert_list,
        signature: BitString::from_slice(&signature),
    })
}

/// A degenerate, certificates-only `SignedData` as served by some CAs.
pub(crate) fn certs_only_pkcs7(certs: &[&[u8]]) -> Vec<u8> {
    let mut certificates = SetOf::new();
    for cert in certs {
        certificates.insert(Any::new(cert.to_vec()));
    }

    encode_signed_data(&SignedData {
        version: 1,
        digest_algorithms: SetOf::new(),
        encap_content_info: EncapsulatedContentInfo {
            content_type: ObjectIdentifier::from(oids::ID_DATA),
            content: None,
        },
        certificates: Some(certificates),
        crls: None,
        signer_infos: SetOf::new(),
    })
    .unwrap()
}

/// A PDF with one signature dictionary whose `/Contents` reserves
/// `placeholder_size` bytes.
pub(crate) fn prepared_pdf(placeholder_size: usize) -> Vec<u8> {
    format!(
        "%PDF-1.7\n\
         1 0 obj\n<< /Type /Catalog /Pages 2 0 R /AcroForm << /Fields [4 0 R] /SigFlags 3 >> >>\nendobj\n\
         2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
         3 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite /SubFilter /ETSI.CAdES.detached \
         /ByteRange {} /Contents {} >>\nendobj\n\
         4 0 obj\n<< /FT /Sig /T (Signature1) /V 3 0 R >>\nendobj\n\
         trailer\n<< /Root 1 0 R >>\n%%EOF\n",
        byte_range_placeholder(),
        contents_placeholder(placeholder_size)
    )
    .into_bytes()
}

/// What [`serve_pki`] answers with.
pub(crate) struct ServedPki<'a> {
    /// Good status for the leaf, signed by the intermediate, which it
    /// embeds.
    pub(crate) ocsp_response: Vec<u8>,
    pub(crate) root_crl: Vec<u8>,
    pub(crate) intermediate_crl: Vec<u8>,
    pub(crate) ocsp: Mock<'a>,
}

/// Serve every certificate, CRL and the leaf's OCSP response of `pki` from
/// `server`. The OCSP endpoint answers for the leaf whatever is asked.
pub(crate) async fn serve_pki<'a>(server: &'a MockServer, pki: &TestPki) -> ServedPki<'a> {
    let cert_id = make_ocsp_cert_id(
        &crate::Certificate::from_der(&pki.leaf.der).unwrap(),
        &crate::Certificate::from_der(&pki.intermediate.der).unwrap(),
        Settings::default().revocation.ocsp_cert_id_hash,
    )
    .unwrap();

    let ocsp_response = ocsp::good_response(&pki.intermediate, &cert_id, &[&pki.intermediate]);
    let root_crl = crl(&pki.root);
    let intermediate_crl = crl(&pki.intermediate);

    for (path, body) in [
        ("/root.cer", &pki.root.der),
        ("/intermediate.cer", &pki.intermediate.der),
        ("/root.crl", &root_crl),
        ("/intermediate.crl", &intermediate_crl),
    ] {
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path(path);
                then.status(200).body(body);
            })
            .await;
    }

    let ocsp = server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/ocsp");
            then.status(200).body(&ocsp_response);
        })
        .await;

    ServedPki {
        ocsp_response,
        root_crl,
        intermediate_crl,
        ocsp,
    }
}
