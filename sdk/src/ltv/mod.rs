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

//! Long-term validation data: certificate chains, revocation evidence and
//! embedded time stamps for a CMS signature.

mod chain;
mod gatherer;
mod revocation;

pub use chain::{CertificateChain, CertificateChainError};
pub use gatherer::{LtvData, LtvGatherer, LtvWarning, LtvWarningCode};
pub use revocation::{RevocationData, RevocationError};
