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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![deny(warnings)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

pub mod certificate;
pub mod cms;
pub mod crypto;
mod error;
pub mod http;
pub mod ltv;
pub mod pdf;
pub mod settings;
pub mod signing;

#[cfg(test)]
pub(crate) mod tests;

pub use certificate::{Certificate, CertificateError};
pub use cms::{CmsBuilder, CmsError};
pub use crypto::{
    hash::DigestAlgorithm,
    raw_signature::{
        kms::{CloudKmsClient, KmsClient, KmsPublicKey, KmsSigner, KmsSignerError},
        KeyType, Pkcs12Signer, PrivateKey, PrivateKeySigner, SignatureAlgorithm, Signer,
        SignerError,
    },
    time_stamp::{TimeStampClient, TimeStampError},
};
pub use error::{Error, Result};
pub use ltv::{
    CertificateChain, CertificateChainError, LtvData, LtvGatherer, LtvWarning, LtvWarningCode,
    RevocationData, RevocationError,
};
pub use pdf::{
    compute_vri_key, DssBuilder, DssError, MemoryObjectStore, ObjectRef, ObjectStore, PdfObject,
    PlaceholderError,
};
pub use settings::Settings;
pub use signing::{
    add_validation_data, sign_prepared_document, timestamp_prepared_document, SignOptions,
    SignedDocument,
};
