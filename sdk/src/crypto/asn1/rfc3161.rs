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

//! ASN.1 types from [RFC 3161] (Time-Stamp Protocol).
//!
//! [RFC 3161]: https://www.rfc-editor.org/rfc/rfc3161

use rasn::prelude::*;
use rasn_pkix::{AlgorithmIdentifier, Extensions, GeneralName};

/// ```ASN.1
/// TimeStampReq ::= SEQUENCE  {
///    version                      INTEGER  { v1(1) },
///    messageImprint               MessageImprint,
///    reqPolicy             TSAPolicyId              OPTIONAL,
///    nonce                 INTEGER                  OPTIONAL,
///    certReq               BOOLEAN                  DEFAULT FALSE,
///    extensions            [0] IMPLICIT Extensions  OPTIONAL  }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct TimeStampReq {
    pub(crate) version: u32,
    pub(crate) message_imprint: MessageImprint,
    pub(crate) req_policy: Option<ObjectIdentifier>,
    pub(crate) nonce: Option<Integer>,
    #[rasn(default)]
    pub(crate) cert_req: bool,
    #[rasn(tag(0))]
    pub(crate) extensions: Option<Extensions>,
}

/// ```ASN.1
/// MessageImprint ::= SEQUENCE  {
///      hashAlgorithm                AlgorithmIdentifier,
///      hashedMessage                OCTET STRING  }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct MessageImprint {
    pub(crate) hash_algorithm: AlgorithmIdentifier,
    pub(crate) hashed_message: OctetString,
}

/// ```ASN.1
/// TimeStampResp ::= SEQUENCE  {
///      status                  PKIStatusInfo,
///      timeStampToken          TimeStampToken     OPTIONAL  }
/// ```
///
/// The token is kept as the raw `ContentInfo` TLV so it can be attached to a
/// CMS signature byte for byte.
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct TimeStampResp {
    pub(crate) status: PkiStatusInfo,
    pub(crate) time_stamp_token: Option<Any>,
}

/// ```ASN.1
/// PKIStatusInfo ::= SEQUENCE {
///     status        PKIStatus,
///     statusString  PKIFreeText     OPTIONAL,
///     failInfo      PKIFailureInfo  OPTIONAL  }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct PkiStatusInfo {
    pub(crate) status: u32,
    pub(crate) status_string: Option<SequenceOf<Utf8String>>,
    pub(crate) fail_info: Option<BitString>,
}

/// Values of `PKIStatus`.
pub(crate) mod pki_status {
    pub(crate) const GRANTED: u32 = 0;
    pub(crate) const GRANTED_WITH_MODS: u32 = 1;
}

/// ```ASN.1
/// TSTInfo ::= SEQUENCE  {
///     version                      INTEGER  { v1(1) },
///     policy                       TSAPolicyId,
///     messageImprint               MessageImprint,
///     serialNumber                 INTEGER,
///     genTime                      GeneralizedTime,
///     accuracy                     Accuracy                 OPTIONAL,
///     ordering                     BOOLEAN             DEFAULT FALSE,
///     nonce                        INTEGER                  OPTIONAL,
///     tsa                          [0] GeneralName          OPTIONAL,
///     extensions                   [1] IMPLICIT Extensions   OPTIONAL  }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct TstInfo {
    pub(crate) version: u32,
    pub(crate) policy: ObjectIdentifier,
    pub(crate) message_imprint: MessageImprint,
    pub(crate) serial_number: Integer,
    pub(crate) gen_time: GeneralizedTime,
    pub(crate) accuracy: Option<Accuracy>,
    #[rasn(default)]
    pub(crate) ordering: bool,
    pub(crate) nonce: Option<Integer>,
    #[rasn(tag(explicit(0)))]
    pub(crate) tsa: Option<GeneralName>,
    #[rasn(tag(1))]
    pub(crate) extensions: Option<Extensions>,
}

/// ```ASN.1
/// Accuracy ::= SEQUENCE {
///     seconds        INTEGER           OPTIONAL,
///     millis     [0] INTEGER  (1..999) OPTIONAL,
///     micros     [1] INTEGER  (1..999) OPTIONAL  }
/// ```
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
pub(crate) struct Accuracy {
    pub(crate) seconds: Option<Integer>,
    #[rasn(tag(0))]
    pub(crate) millis: Option<Integer>,
    #[rasn(tag(1))]
    pub(crate) micros: Option<Integer>,
}
