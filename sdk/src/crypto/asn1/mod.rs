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

//! Just enough ASN.1 to build and parse the structures this crate deals
//! with. Certificates and OCSP come from `rasn_pkix` and `rasn_ocsp`.

use rasn::prelude::*;

pub(crate) mod oids;
pub(crate) mod pkcs12;
pub(crate) mod rfc3161;
pub(crate) mod rfc4055;
pub(crate) mod rfc5035;
pub(crate) mod rfc5652;
pub(crate) mod rfc6211;

/// `ContentInfo` as defined in RFC 5652 section 3.
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ContentInfo {
    pub(crate) content_type: ObjectIdentifier,

    #[rasn(tag(explicit(0)))]
    pub(crate) content: Any,
}
