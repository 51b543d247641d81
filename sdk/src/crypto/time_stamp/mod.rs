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

//! [RFC 3161] time stamp client.
//!
//! [RFC 3161]: https://www.rfc-editor.org/rfc/rfc3161

mod client;
mod error;
mod response;

pub use client::TimeStampClient;
pub use error::TimeStampError;
#[cfg(test)]
pub(crate) use response::{signed_data_from_token, tst_info_from_signed_data};
