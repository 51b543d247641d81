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

//! Configuration for network access, chain building, revocation checking,
//! signing, and time stamping.
//!
//! Settings are layered with the [`config`] crate: start from
//! [`Settings::new`] (the defaults) and overlay JSON or TOML fragments.

use std::path::Path;

use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{crypto::hash::DigestAlgorithm, Error, Result};

/// Placeholder size large enough for an RSA-4096 CMS with a chain and a
/// time stamp token.
pub const DEFAULT_PLACEHOLDER_SIZE: usize = 12_288;

/// Default cap on the number of certificates in a completed chain.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 10;

pub(crate) trait SettingsValidate {
    // Returns error if settings are invalid.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings for outbound HTTP requests.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Network {
    /// Timeout applied to each individual request, in seconds.
    pub timeout_secs: u64,

    /// Responses larger than this many bytes are rejected.
    pub max_response_size: usize,

    /// Optional `User-Agent` header value.
    pub user_agent: Option<String>,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_response_size: 10 * 1024 * 1024,
            user_agent: None,
        }
    }
}

impl SettingsValidate for Network {
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::BadParam(
                "network.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_response_size == 0 {
            return Err(Error::BadParam(
                "network.max_response_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for AIA chain completion.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Chain {
    /// Hard cap on the total number of certificates in a chain.
    pub max_length: usize,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

impl SettingsValidate for Chain {
    fn validate(&self) -> Result<()> {
        if self.max_length == 0 || self.max_length > 64 {
            return Err(Error::BadParam(
                "chain.max_length must be between 1 and 64".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for OCSP and CRL retrieval.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Revocation {
    /// Hash used for the issuer name and key in OCSP `CertID`s.
    ///
    /// SHA-1 is what nearly every responder understands. Some responders
    /// require SHA-256.
    pub ocsp_cert_id_hash: DigestAlgorithm,

    /// Query OCSP before falling back to CRLs.
    pub prefer_ocsp: bool,

    /// Fetch CRLs at all.
    pub fetch_crl: bool,
}

impl Default for Revocation {
    fn default() -> Self {
        Self {
            ocsp_cert_id_hash: DigestAlgorithm::Sha1,
            prefer_ocsp: true,
            fetch_crl: true,
        }
    }
}

impl SettingsValidate for Revocation {
    fn validate(&self) -> Result<()> {
        match self.ocsp_cert_id_hash {
            DigestAlgorithm::Sha1 | DigestAlgorithm::Sha256 => Ok(()),
            alg => Err(Error::BadParam(format!(
                "revocation.ocsp_cert_id_hash must be sha1 or sha256, not {alg}"
            ))),
        }
    }
}

/// Settings for producing signatures.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Signing {
    /// Number of bytes reserved in `/Contents` for the CMS blob.
    pub placeholder_size: usize,

    /// Digest algorithm for the document digest and signed attributes.
    pub digest_algorithm: DigestAlgorithm,

    /// Include the CMS `signing-time` attribute.
    pub include_signing_time: bool,
}

impl Default for Signing {
    fn default() -> Self {
        Self {
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
            digest_algorithm: DigestAlgorithm::Sha256,
            include_signing_time: true,
        }
    }
}

impl SettingsValidate for Signing {
    fn validate(&self) -> Result<()> {
        if self.placeholder_size == 0 {
            return Err(Error::BadParam(
                "signing.placeholder_size must be greater than zero".into(),
            ));
        }
        if self.digest_algorithm == DigestAlgorithm::Sha1 {
            return Err(Error::BadParam(
                "signing.digest_algorithm may not be sha1".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the RFC 3161 time stamp authority.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimeStamp {
    /// TSA endpoint. No time stamps are requested when unset.
    pub url: Option<String>,

    /// Digest algorithm for the message imprint.
    pub digest_algorithm: DigestAlgorithm,

    /// Ask the TSA to include its signing certificate in the token.
    pub request_certificate: bool,
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self {
            url: None,
            digest_algorithm: DigestAlgorithm::Sha256,
            request_certificate: true,
        }
    }
}

impl SettingsValidate for TimeStamp {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            let parsed = url::Url::parse(url)
                .map_err(|e| Error::BadParam(format!("time_stamp.url is invalid: {e}")))?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::BadParam(
                    "time_stamp.url must use http or https".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Settings for all components of this crate.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    /// HTTP settings.
    pub network: Network,

    /// AIA chain completion settings.
    pub chain: Chain,

    /// OCSP / CRL settings.
    pub revocation: Revocation,

    /// Signature production settings.
    pub signing: Signing,

    /// Time stamp authority settings.
    #[serde(rename = "timestamp")]
    pub time_stamp: TimeStamp,
}

impl Settings {
    /// Create a new [`Settings`] with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pades_ltv::Settings;
    /// # fn main() -> pades_ltv::Result<()> {
    /// let settings = Settings::new().with_json(r#"{"chain": {"max_length": 5}}"#)?;
    /// assert_eq!(settings.chain.max_length, 5);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay a JSON fragment on top of these settings.
    pub fn with_json(self, json: &str) -> Result<Self> {
        self.with_string(json, "json")
    }

    /// Overlay a TOML fragment on top of these settings.
    ///
    /// ```
    /// # use pades_ltv::Settings;
    /// # fn main() -> pades_ltv::Result<()> {
    /// let settings = Settings::new().with_toml(
    ///     r#"
    ///         [timestamp]
    ///         url = "http://timestamp.example.com/tsa"
    ///     "#,
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_toml(self, toml: &str) -> Result<Self> {
        self.with_string(toml, "toml")
    }

    /// Overlay a settings file. The format (JSON or TOML) is inferred from
    /// the file extension.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .ok_or(Error::BadParam(
                "settings file must have json or toml extension".into(),
            ))?
            .to_str()
            .ok_or(Error::BadParam("invalid settings file name".into()))?
            .to_owned();
        let setting_buf = std::fs::read(path).map_err(Error::IoError)?;
        self.with_string(&String::from_utf8_lossy(&setting_buf), &ext)
    }

    fn with_string(self, settings_str: &str, format: &str) -> Result<Self> {
        let f = match format.to_lowercase().as_str() {
            "json" => FileFormat::Json,
            "toml" => FileFormat::Toml,
            _ => return Err(Error::UnsupportedType),
        };

        let current_config = Config::try_from(&self).map_err(|e| Error::OtherError(Box::new(e)))?;

        let updated_config = Config::builder()
            .add_source(current_config)
            .add_source(config::File::from_str(settings_str, f))
            .build()
            .map_err(|e| Error::BadParam(format!("could not parse configuration: {e}")))?;

        let settings = updated_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadParam(e.to_string()))?;

        settings.validate()?;

        Ok(settings)
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.chain.validate()?;
        self.revocation.validate()?;
        self.signing.validate()?;
        self.time_stamp.validate()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::new();

        assert_eq!(settings.chain.max_length, 10);
        assert_eq!(settings.signing.placeholder_size, 12_288);
        assert_eq!(settings.revocation.ocsp_cert_id_hash, DigestAlgorithm::Sha1);
        assert!(settings.time_stamp.url.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn overlay_toml() {
        let settings = Settings::new()
            .with_toml(
                r#"
                [revocation]
                ocsp_cert_id_hash = "sha256"

                [timestamp]
                url = "http://tsa.example.com/"
                "#,
            )
            .unwrap();

        assert_eq!(
            settings.revocation.ocsp_cert_id_hash,
            DigestAlgorithm::Sha256
        );
        assert_eq!(
            settings.time_stamp.url.as_deref(),
            Some("http://tsa.example.com/")
        );
        // untouched sections keep their defaults
        assert_eq!(settings.signing, Signing::default());
    }

    #[test]
    fn overlay_json() {
        let settings = Settings::new()
            .with_json(r#"{"network": {"timeout_secs": 5}, "signing": {"placeholder_size": 20000}}"#)
            .unwrap();

        assert_eq!(settings.network.timeout_secs, 5);
        assert_eq!(settings.signing.placeholder_size, 20_000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::new()
            .with_json(r#"{"chain": {"max_length": 0}}"#)
            .is_err());
        assert!(Settings::new()
            .with_json(r#"{"revocation": {"ocsp_cert_id_hash": "sha512"}}"#)
            .is_err());
        assert!(Settings::new()
            .with_json(r#"{"timestamp": {"url": "ftp://tsa.example.com"}}"#)
            .is_err());
        assert!(matches!(
            Settings::new().with_string("", "yaml"),
            Err(Error::UnsupportedType)
        ));
    }
}
