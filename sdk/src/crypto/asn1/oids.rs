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

//! Object identifiers used when building and parsing CMS, PKCS#12, OCSP and
//! RFC 3161 structures.

use rasn::types::Oid;

// Digests
pub(crate) const SHA1: &Oid = Oid::const_new(&[1, 3, 14, 3, 2, 26]);
pub(crate) const SHA256: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 1]);
pub(crate) const SHA384: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 2]);
pub(crate) const SHA512: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 3]);

// Signature algorithms
pub(crate) const SHA1_WITH_RSA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 5]);
pub(crate) const MGF1: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 8]);
pub(crate) const RSASSA_PSS: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 10]);
pub(crate) const SHA256_WITH_RSA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 11]);
pub(crate) const SHA384_WITH_RSA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 12]);
pub(crate) const SHA512_WITH_RSA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 13]);

pub(crate) const ECDSA_WITH_SHA1: &Oid = Oid::const_new(&[1, 2, 840, 10045, 4, 1]);
pub(crate) const ECDSA_WITH_SHA256: &Oid = Oid::const_new(&[1, 2, 840, 10045, 4, 3, 2]);
pub(crate) const ECDSA_WITH_SHA384: &Oid = Oid::const_new(&[1, 2, 840, 10045, 4, 3, 3]);
pub(crate) const ECDSA_WITH_SHA512: &Oid = Oid::const_new(&[1, 2, 840, 10045, 4, 3, 4]);

// CMS content types and attributes
pub(crate) const ID_DATA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 7, 1]);
pub(crate) const ID_SIGNED_DATA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 7, 2]);
pub(crate) const ID_ENCRYPTED_DATA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 7, 6]);
pub(crate) const ID_CT_TST_INFO: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 9, 16, 1, 4]);

pub(crate) const CONTENT_TYPE: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 9, 3]);
pub(crate) const MESSAGE_DIGEST: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 9, 4]);
pub(crate) const SIGNING_TIME: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 9, 5]);
pub(crate) const TIME_STAMP_TOKEN: &Oid =
    Oid::const_new(&[1, 2, 840, 113549, 1, 9, 16, 2, 14]);
pub(crate) const SIGNING_CERTIFICATE_V2: &Oid =
    Oid::const_new(&[1, 2, 840, 113549, 1, 9, 16, 2, 47]);
pub(crate) const CMS_ALGORITHM_PROTECTION: &Oid =
    Oid::const_new(&[1, 2, 840, 113549, 1, 9, 52]);

// PKCS#12
pub(crate) const KEY_BAG: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 10, 1, 1]);
pub(crate) const PKCS8_SHROUDED_KEY_BAG: &Oid =
    Oid::const_new(&[1, 2, 840, 113549, 1, 12, 10, 1, 2]);
pub(crate) const CERT_BAG: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 10, 1, 3]);
pub(crate) const X509_CERTIFICATE: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 9, 22, 1]);

pub(crate) const PBE_SHA_3DES: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 1, 3]);
pub(crate) const PBE_SHA_2DES: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 1, 4]);
pub(crate) const PBE_SHA_RC2_128: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 1, 5]);
pub(crate) const PBE_SHA_RC2_40: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 12, 1, 6]);
pub(crate) const PBES2: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 5, 13]);
pub(crate) const PBKDF2: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 5, 12]);
pub(crate) const HMAC_SHA1: &Oid = Oid::const_new(&[1, 2, 840, 113549, 2, 7]);
pub(crate) const HMAC_SHA256: &Oid = Oid::const_new(&[1, 2, 840, 113549, 2, 9]);
pub(crate) const HMAC_SHA384: &Oid = Oid::const_new(&[1, 2, 840, 113549, 2, 10]);
pub(crate) const HMAC_SHA512: &Oid = Oid::const_new(&[1, 2, 840, 113549, 2, 11]);
pub(crate) const AES128_CBC: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 1, 2]);
pub(crate) const AES192_CBC: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 1, 22]);
pub(crate) const AES256_CBC: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 1, 42]);
pub(crate) const DES_EDE3_CBC: &Oid = Oid::const_new(&[1, 2, 840, 113549, 3, 7]);

// OCSP
pub(crate) const OCSP_BASIC: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 1]);
