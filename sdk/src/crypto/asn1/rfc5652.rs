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

//! The `SignedData` subset of [RFC 5652] (Cryptographic Message Syntax).
//!
//! Certificates and CRLs are kept as raw TLVs so they survive a decode and
//! re-encode byte for byte.
//!
//! [RFC 5652]: https://www.rfc-editor.org/rfc/rfc5652

use rasn::prelude::*;
use rasn_pkix::{AlgorithmIdentifier, Name};

/// ```ASN.1
/// SignedData ::= SEQUENCE {
///     version CMSVersion,
///     digestAlgorithms DigestAlgorithmIdentifiers,
///     encapContentInfo EncapsulatedContentInfo,
///     certificates [0] IMPLICIT CertificateSet OPTIONAL,
///     crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///     signerInfos SignerInfos }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
pub(crate) struct SignedData {
    pub(crate) version: u32,
    pub(crate) digest_algorithms: SetOf<AlgorithmIdentifier>,
    pub(crate) encap_content_info: EncapsulatedContentInfo,
    #[rasn(tag(0))]
    pub(crate) certificates: Option<SetOf<Any>>,
    #[rasn(tag(1))]
    pub(crate) crls: Option<SetOf<Any>>,
    pub(crate) signer_infos: SetOf<SignerInfo>,
}

/// ```ASN.1
/// EncapsulatedContentInfo ::= SEQUENCE {
///     eContentType ContentType,
///     eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
pub(crate) struct EncapsulatedContentInfo {
    pub(crate) content_type: ObjectIdentifier,
    #[rasn(tag(explicit(0)))]
    pub(crate) content: Option<OctetString>,
}

/// ```ASN.1
/// SignerInfo ::= SEQUENCE {
///     version CMSVersion,
///     sid SignerIdentifier,
///     digestAlgorithm DigestAlgorithmIdentifier,
///     signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature SignatureValue,
///     unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
pub(crate) struct SignerInfo {
    pub(crate) version: u32,
    pub(crate) sid: SignerIdentifier,
    pub(crate) digest_algorithm: AlgorithmIdentifier,
    #[rasn(tag(0))]
    pub(crate) signed_attrs: Option<SetOf<Attribute>>,
    pub(crate) signature_algorithm: AlgorithmIdentifier,
    pub(crate) signature: OctetString,
    #[rasn(tag(1))]
    pub(crate) unsigned_attrs: Option<SetOf<Attribute>>,
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
#[rasn(choice)]
pub(crate) enum SignerIdentifier {
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    #[rasn(tag(0))]
    SubjectKeyIdentifier(OctetString),
}

#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
pub(crate) struct IssuerAndSerialNumber {
    pub(crate) issuer: Name,
    pub(crate) serial_number: Integer,
}

/// ```ASN.1
/// Attribute ::= SEQUENCE {
///     attrType OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, Hash)]
pub(crate) struct Attribute {
    pub(crate) attr_type: ObjectIdentifier,
    pub(crate) attr_values: SetOf<Any>,
}

impl Attribute {
    /// An attribute with a single DER-encoded value.
    pub(crate) fn new(oid: &'static Oid, value: Vec<u8>) -> Self {
        let mut attr_values = SetOf::new();
        attr_values.insert(Any::new(value));

        Self {
            attr_type: ObjectIdentifier::from(oid),
            attr_values,
        }
    }
}
