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

//! PKCS#12 ([RFC 7292]) and PKCS#5 ([RFC 8018]) structures.
//!
//! [RFC 7292]: https://www.rfc-editor.org/rfc/rfc7292
//! [RFC 8018]: https://www.rfc-editor.org/rfc/rfc8018

use rasn::prelude::*;
use rasn_pkix::{AlgorithmIdentifier, Attribute};

use super::ContentInfo;

/// ```ASN.1
/// PFX ::= SEQUENCE {
///     version     INTEGER {v3(3)}(v3,...),
///     authSafe    ContentInfo,
///     macData     MacData OPTIONAL }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct Pfx {
    pub(crate) version: u32,
    pub(crate) auth_safe: ContentInfo,
    pub(crate) mac_data: Option<MacData>,
}

/// ```ASN.1
/// MacData ::= SEQUENCE {
///     mac         DigestInfo,
///     macSalt     OCTET STRING,
///     iterations  INTEGER DEFAULT 1 }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct MacData {
    pub(crate) mac: DigestInfo,
    pub(crate) mac_salt: OctetString,
    pub(crate) iterations: Option<u32>,
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct DigestInfo {
    pub(crate) digest_algorithm: AlgorithmIdentifier,
    pub(crate) digest: OctetString,
}

/// `AuthenticatedSafe ::= SEQUENCE OF ContentInfo`
pub(crate) type AuthenticatedSafe = SequenceOf<ContentInfo>;

/// `SafeContents ::= SEQUENCE OF SafeBag`
pub(crate) type SafeContents = SequenceOf<SafeBag>;

/// ```ASN.1
/// SafeBag ::= SEQUENCE {
///     bagId          BAG-TYPE.&id ({PKCS12BagSet}),
///     bagValue       [0] EXPLICIT BAG-TYPE.&Type({PKCS12BagSet}{@bagId}),
///     bagAttributes  SET OF PKCS12Attribute OPTIONAL }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct SafeBag {
    pub(crate) bag_id: ObjectIdentifier,
    #[rasn(tag(explicit(0)))]
    pub(crate) bag_value: Any,
    pub(crate) bag_attributes: Option<SetOf<Attribute>>,
}

/// ```ASN.1
/// CertBag ::= SEQUENCE {
///     certId      BAG-TYPE.&id   ({CertTypes}),
///     certValue   [0] EXPLICIT BAG-TYPE.&Type ({CertTypes}{@certId}) }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct CertBag {
    pub(crate) cert_id: ObjectIdentifier,
    #[rasn(tag(explicit(0)))]
    pub(crate) cert_value: Any,
}

/// `EncryptedData` from RFC 5652 section 8, without unprotected attributes.
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct EncryptedData {
    pub(crate) version: u32,
    pub(crate) encrypted_content_info: EncryptedContentInfo,
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct EncryptedContentInfo {
    pub(crate) content_type: ObjectIdentifier,
    pub(crate) content_encryption_algorithm: AlgorithmIdentifier,
    #[rasn(tag(0))]
    pub(crate) encrypted_content: Option<OctetString>,
}

/// ```ASN.1
/// EncryptedPrivateKeyInfo ::= SEQUENCE {
///     encryptionAlgorithm  EncryptionAlgorithmIdentifier,
///     encryptedData        EncryptedData }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct EncryptedPrivateKeyInfo {
    pub(crate) encryption_algorithm: AlgorithmIdentifier,
    pub(crate) encrypted_data: OctetString,
}

/// Parameters of the `pbeWithSHAAnd*` schemes from RFC 7292 appendix C.
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct Pkcs12PbeParams {
    pub(crate) salt: OctetString,
    pub(crate) iterations: u32,
}

/// ```ASN.1
/// PBES2-params ::= SEQUENCE {
///     keyDerivationFunc AlgorithmIdentifier {{PBES2-KDFs}},
///     encryptionScheme AlgorithmIdentifier {{PBES2-Encs}} }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct Pbes2Params {
    pub(crate) key_derivation_func: AlgorithmIdentifier,
    pub(crate) encryption_scheme: AlgorithmIdentifier,
}

/// ```ASN.1
/// PBKDF2-params ::= SEQUENCE {
///     salt CHOICE { specified OCTET STRING, ... },
///     iterationCount INTEGER (1..MAX),
///     keyLength INTEGER (1..MAX) OPTIONAL,
///     prf AlgorithmIdentifier {{PBKDF2-PRFs}} DEFAULT algid-hmacWithSHA1 }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct Pbkdf2Params {
    pub(crate) salt: OctetString,
    pub(crate) iteration_count: u32,
    pub(crate) key_length: Option<u32>,
    pub(crate) prf: Option<AlgorithmIdentifier>,
}
