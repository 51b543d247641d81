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

//! Signers that produce the raw signature value of a CMS `SignerInfo`.
//!
//! Three backends implement [`Signer`]: [`Pkcs12Signer`] for key stores,
//! [`PrivateKeySigner`] for keys the caller already holds, and
//! [`kms::KmsSigner`] for keys that stay inside a remote KMS.

mod key_signer;
pub mod kms;
mod pkcs12;
mod signer;
mod signing_alg;

pub use key_signer::{PrivateKey, PrivateKeySigner};
#[cfg(test)]
pub(crate) use pkcs12::{cipher, kdf};
pub use pkcs12::Pkcs12Signer;
pub use signer::{Signer, SignerError};
pub(crate) use signing_alg::signature_algorithm_identifier;
pub use signing_alg::{KeyType, SignatureAlgorithm};
