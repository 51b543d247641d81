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

//! Cryptography primitives: hashing, ASN.1 structures, signers, and the
//! OCSP / CRL / RFC 3161 network protocols.

pub(crate) mod asn1;
pub mod crl;
pub(crate) mod ec_utils;
pub mod hash;
pub mod ocsp;
pub mod raw_signature;
pub mod time_stamp;
