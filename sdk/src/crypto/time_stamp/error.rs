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

use crate::http::HttpResolverError;

/// Describes errors that can occur when requesting an [RFC 3161] time stamp.
///
/// [RFC 3161]: https://www.ietf.org/rfc/rfc3161.txt
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimeStampError {
    /// No time stamp authority URL is configured.
    #[error("no time stamp authority configured")]
    NoUrl,

    /// The time stamp authority refused the request.
    ///
    /// `reason` is the free text the TSA sent back, if any.
    #[error("time stamp request rejected (status = {status}): {reason}")]
    Rejected {
        /// The `PKIStatus` value.
        status: u32,

        /// The `statusString` text.
        reason: String,
    },

    /// The response was granted but carries no token.
    #[error("time stamp response contains no token")]
    NoToken,

    /// The time stamp service did not respond with the same nonce as provided.
    #[error("nonce mismatch")]
    NonceMismatch,

    /// The token covers a different message than the one submitted.
    #[error("time stamp does not match data")]
    ImprintMismatch,

    /// An error was encountered when decoding the time stamp response.
    #[error("decode error ({0})")]
    DecodeError(String),

    /// The request could not be encoded.
    #[error("encode error ({0})")]
    EncodeError(String),

    /// Unable to complete the HTTP time stamp request.
    #[error(transparent)]
    Http(#[from] HttpResolverError),
}
