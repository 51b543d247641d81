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

use thiserror::Error;

use crate::{
    certificate::CertificateError,
    cms::CmsError,
    crypto::{raw_signature::SignerError, time_stamp::TimeStampError},
    http::HttpResolverError,
    ltv::{CertificateChainError, RevocationError},
    pdf::{DssError, PlaceholderError},
};

/// `Error` enumerates errors returned by most public APIs of this crate.
///
/// Each variant wraps the error type of the component that raised it so the
/// caller can still match on the specific failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The signature did not fit, or the placeholders could not be located.
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    /// The signer could not be loaded or failed to sign.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// A CMS structure could not be built or parsed.
    #[error(transparent)]
    Cms(#[from] CmsError),

    /// A certificate could not be parsed.
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    /// The certificate chain could not be completed.
    #[error(transparent)]
    CertificateChain(#[from] CertificateChainError),

    /// Revocation data could not be obtained.
    #[error(transparent)]
    Revocation(#[from] RevocationError),

    /// The time stamp authority rejected the request or was unreachable.
    #[error(transparent)]
    TimeStamp(#[from] TimeStampError),

    /// The document security store could not be loaded or written.
    #[error(transparent)]
    Dss(#[from] DssError),

    /// A network request failed.
    #[error(transparent)]
    Http(#[from] HttpResolverError),

    /// A parameter was invalid.
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// A file could not be read.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// The requested format is not supported.
    #[error("type is unsupported")]
    UnsupportedType,

    /// Any other error.
    #[error(transparent)]
    OtherError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// A specialized `Result` type for PAdES operations.
pub type Result<T> = std::result::Result<T, Error>;
