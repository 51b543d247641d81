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

//! Signing with keys that never leave a remote key management service.
//!
//! Only digests cross the network. [`KmsSigner`] checks at construction time
//! that the KMS key and the supplied certificate carry the same public key,
//! since a mismatched pair would yield signatures that look valid but never
//! verify.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::{header, Request, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{key_signer::same_public_key, KeyType, SignatureAlgorithm, Signer, SignerError};
use crate::{
    certificate::Certificate,
    crypto::hash::DigestAlgorithm,
    http::{AsyncHttpResolver, HttpClient, HttpResolverError},
    settings::Settings,
};

/// Describes errors reported by a remote KMS or detected while pairing a
/// KMS key with its certificate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KmsSignerError {
    /// The key does not exist.
    #[error("KMS key not found: {0}")]
    NotFound(String),

    /// The caller may not use the key.
    #[error("permission denied for KMS key: {0}")]
    PermissionDenied(String),

    /// The service is temporarily unavailable or rate limited.
    #[error("KMS unavailable: {0}")]
    Unavailable(String),

    /// The certificate's public key is not the KMS key's public key.
    #[error("the certificate does not match the KMS key")]
    CertificateMismatch,

    /// A signature was requested with a digest other than the one the key
    /// was provisioned for.
    #[error("KMS key is provisioned for {provisioned}, not {requested}")]
    DigestMismatch {
        /// The digest algorithm the key accepts.
        provisioned: DigestAlgorithm,

        /// The digest algorithm that was requested.
        requested: DigestAlgorithm,
    },

    /// The key's algorithm is not supported by this crate.
    #[error("unsupported KMS key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The service answered with something unexpected.
    #[error("invalid KMS response: {0}")]
    InvalidResponse(String),

    /// The request did not complete.
    #[error(transparent)]
    Http(#[from] HttpResolverError),
}

/// A KMS key's public half, as reported by the service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KmsPublicKey {
    /// Provider-specific algorithm name, e.g. `EC_SIGN_P256_SHA256`.
    pub algorithm: String,

    /// DER-encoded `SubjectPublicKeyInfo`.
    pub public_key_info: Vec<u8>,
}

/// Access to a remote KMS.
#[async_trait]
pub trait KmsClient: Send + Sync {
    /// Fetch the public key and algorithm of `key_name`.
    async fn public_key(&self, key_name: &str) -> Result<KmsPublicKey, KmsSignerError>;

    /// Sign a precomputed `digest` with `key_name`.
    async fn sign_digest(
        &self,
        key_name: &str,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, KmsSignerError>;
}

#[async_trait]
impl<T: KmsClient + ?Sized> KmsClient for Arc<T> {
    async fn public_key(&self, key_name: &str) -> Result<KmsPublicKey, KmsSignerError> {
        (**self).public_key(key_name).await
    }

    async fn sign_digest(
        &self,
        key_name: &str,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, KmsSignerError> {
        (**self).sign_digest(key_name, digest_algorithm, digest).await
    }
}

/// Map a KMS algorithm name to key type, signature scheme and digest.
///
/// Names follow the Cloud KMS `CryptoKeyVersionAlgorithm` enumeration.
pub fn map_kms_algorithm(
    name: &str,
) -> Result<(KeyType, SignatureAlgorithm, DigestAlgorithm), KmsSignerError> {
    let unsupported = || KmsSignerError::UnsupportedAlgorithm(name.to_string());

    let digest = match name.rsplit('_').next() {
        Some("SHA256") => DigestAlgorithm::Sha256,
        Some("SHA384") => DigestAlgorithm::Sha384,
        Some("SHA512") => DigestAlgorithm::Sha512,
        _ => return Err(unsupported()),
    };

    if name.starts_with("RSA_SIGN_PKCS1_") {
        return Ok((KeyType::Rsa, SignatureAlgorithm::RsaPkcs1v15, digest));
    }
    if name.starts_with("RSA_SIGN_PSS_") {
        return Ok((KeyType::Rsa, SignatureAlgorithm::RsaPss, digest));
    }

    match name {
        "EC_SIGN_P256_SHA256" | "EC_SIGN_P384_SHA384" => {
            Ok((KeyType::Ec, SignatureAlgorithm::Ecdsa, digest))
        }
        _ => Err(unsupported()),
    }
}

/// A [`Signer`] whose private key lives in a remote KMS.
pub struct KmsSigner<C> {
    client: C,
    key_name: String,
    certificate: Vec<u8>,
    chain: Vec<Vec<u8>>,
    key_type: KeyType,
    signature_algorithm: SignatureAlgorithm,
    digest_algorithm: DigestAlgorithm,
}

impl<C: KmsClient> KmsSigner<C> {
    /// Pair the KMS key `key_name` with its certificate.
    ///
    /// Fails with [`KmsSignerError::UnsupportedAlgorithm`] for algorithms
    /// other than RSA PKCS#1 v1.5, RSA-PSS, and ECDSA on P-256 or P-384, and
    /// with [`KmsSignerError::CertificateMismatch`] when the certificate
    /// belongs to another key.
    pub async fn new(
        client: C,
        key_name: impl Into<String>,
        certificate: Vec<u8>,
        chain: Vec<Vec<u8>>,
    ) -> Result<Self, KmsSignerError> {
        let key_name = key_name.into();

        let public_key = client.public_key(&key_name).await?;
        let (key_type, signature_algorithm, digest_algorithm) =
            map_kms_algorithm(&public_key.algorithm)?;

        let cert = Certificate::from_der(&certificate)
            .map_err(|e| KmsSignerError::InvalidCertificate(e.to_string()))?;

        let matches = same_public_key(&public_key.public_key_info, cert.subject_public_key_info())
            .map_err(|e| KmsSignerError::InvalidResponse(e.to_string()))?;
        if !matches {
            return Err(KmsSignerError::CertificateMismatch);
        }

        log::debug!("KMS key {key_name} uses {signature_algorithm} with {digest_algorithm}");

        Ok(Self {
            client,
            key_name,
            certificate,
            chain,
            key_type,
            signature_algorithm,
            digest_algorithm,
        })
    }

    /// The only digest algorithm this key signs.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }
}

#[async_trait]
impl<C: KmsClient> Signer for KmsSigner<C> {
    fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    fn key_type(&self) -> KeyType {
        self.key_type
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    async fn sign(
        &self,
        data: &[u8],
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Vec<u8>, SignerError> {
        if digest_algorithm != self.digest_algorithm {
            return Err(KmsSignerError::DigestMismatch {
                provisioned: self.digest_algorithm,
                requested: digest_algorithm,
            }
            .into());
        }

        let digest = digest_algorithm.digest(data);
        Ok(self
            .client
            .sign_digest(&self.key_name, digest_algorithm, &digest)
            .await?)
    }
}

const CLOUD_KMS_ENDPOINT: &str = "https://cloudkms.googleapis.com/v1";

/// [`KmsClient`] for the Google Cloud KMS REST API.
///
/// Key names are full `CryptoKeyVersion` resource names
/// (`projects/…/locations/…/keyRings/…/cryptoKeys/…/cryptoKeyVersions/N`).
pub struct CloudKmsClient {
    http: HttpClient,
    endpoint: String,
    access_token: String,
}

#[derive(Deserialize)]
struct PublicKeyResponse {
    pem: String,
    algorithm: String,
}

#[derive(Deserialize)]
struct SignResponse {
    signature: String,
}

impl CloudKmsClient {
    /// Create a client that authenticates with an OAuth 2.0 bearer token.
    pub fn new(
        resolver: impl AsyncHttpResolver + 'static,
        settings: &Settings,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http: HttpClient::new(Arc::new(resolver), &settings.network),
            endpoint: CLOUD_KMS_ENDPOINT.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Use another API endpoint, such as a regional or private one.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    async fn call(
        &self,
        request: http::request::Builder,
        key_name: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, KmsSignerError> {
        let request = request
            .header(header::AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(header::ACCEPT, "application/json")
            .body(body)
            .map_err(HttpResolverError::from)?;

        let response = self.http.send(request).await?;
        let status = response.status();

        match status {
            StatusCode::OK => Ok(response.into_body()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(KmsSignerError::PermissionDenied(key_name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(KmsSignerError::NotFound(key_name.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(KmsSignerError::Unavailable(format!(
                "rate limited while using {key_name}"
            ))),
            s if s.is_server_error() => Err(KmsSignerError::Unavailable(format!(
                "server answered {} for {key_name}",
                s.as_u16()
            ))),
            s => Err(KmsSignerError::InvalidResponse(format!(
                "unexpected status {}",
                s.as_u16()
            ))),
        }
    }
}

fn from_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, KmsSignerError> {
    serde_json::from_slice(body).map_err(|e| KmsSignerError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl KmsClient for CloudKmsClient {
    async fn public_key(&self, key_name: &str) -> Result<KmsPublicKey, KmsSignerError> {
        let url = format!("{}/{key_name}/publicKey", self.endpoint);
        let body = self.call(Request::get(url), key_name, Vec::new()).await?;

        let response: PublicKeyResponse = from_json(&body)?;
        let pem = pem::parse(response.pem.as_bytes())
            .map_err(|e| KmsSignerError::InvalidResponse(format!("public key PEM: {e}")))?;

        Ok(KmsPublicKey {
            algorithm: response.algorithm,
            public_key_info: pem.into_contents(),
        })
    }

    async fn sign_digest(
        &self,
        key_name: &str,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, KmsSignerError> {
        let url = format!("{}/{key_name}:asymmetricSign", self.endpoint);
        let mut digest_field = serde_json::Map::new();
        digest_field.insert(digest_algorithm.to_string(), STANDARD.encode(digest).into());
        let body = serde_json::json!({ "digest": digest_field });

        let request = Request::post(url).header(header::CONTENT_TYPE, "application/json");
        let body = self
            .call(request, key_name, body.to_string().into_bytes())
            .await?;

        let response: SignResponse = from_json(&body)?;
        STANDARD
            .decode(response.signature)
            .map_err(|e| KmsSignerError::InvalidResponse(format!("signature: {e}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use httpmock::{Method, MockServer};

    use super::*;
    use crate::tests::fixtures::TestPki;

    const KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1";

    fn public_key_json(pki: &TestPki, algorithm: &str) -> serde_json::Value {
        let spki = pki.leaf.key.public_key_info().unwrap();
        serde_json::json!({
            "pem": pem::encode(&pem::Pem::new("PUBLIC KEY", spki)),
            "algorithm": algorithm,
        })
    }

    fn client(server: &MockServer) -> CloudKmsClient {
        CloudKmsClient::new(reqwest::Client::new(), &Settings::default(), "token")
            .with_endpoint(server.base_url())
    }

    #[test]
    fn algorithm_names_map() {
        assert_eq!(
            map_kms_algorithm("EC_SIGN_P384_SHA384").unwrap(),
            (KeyType::Ec, SignatureAlgorithm::Ecdsa, DigestAlgorithm::Sha384)
        );
        assert_eq!(
            map_kms_algorithm("RSA_SIGN_PSS_4096_SHA512").unwrap(),
            (KeyType::Rsa, SignatureAlgorithm::RsaPss, DigestAlgorithm::Sha512)
        );
        assert_eq!(
            map_kms_algorithm("RSA_SIGN_PKCS1_2048_SHA256").unwrap(),
            (KeyType::Rsa, SignatureAlgorithm::RsaPkcs1v15, DigestAlgorithm::Sha256)
        );

        for name in ["EC_SIGN_SECP256K1_SHA256", "RSA_SIGN_RAW_PKCS1_2048", "HMAC_SHA256"] {
            assert!(matches!(
                map_kms_algorithm(name),
                Err(KmsSignerError::UnsupportedAlgorithm(_))
            ));
        }
    }

    #[tokio::test]
    async fn signs_digest_remotely() {
        let pki = TestPki::ec("http://localhost");
        let server = MockServer::start_async().await;

        let digest = DigestAlgorithm::Sha256.digest(b"signed attributes");
        let signature = pki
            .leaf
            .key
            .sign_prehash(SignatureAlgorithm::Ecdsa, DigestAlgorithm::Sha256, &digest)
            .unwrap();

        let public_key = server
            .mock_async(|when, then| {
                when.method(Method::GET)
                    .path(format!("/{KEY}/publicKey"))
                    .header("authorization", "Bearer token");
                then.status(200)
                    .json_body(public_key_json(&pki, "EC_SIGN_P256_SHA256"));
            })
            .await;

        let sign = server
            .mock_async(|when, then| {
                when.method(Method::POST)
                    .path(format!("/{KEY}:asymmetricSign"))
                    .json_body(serde_json::json!({
                        "digest": { "sha256": STANDARD.encode(&digest) }
                    }));
                then.status(200)
                    .json_body(serde_json::json!({ "signature": STANDARD.encode(&signature) }));
            })
            .await;

        let signer = KmsSigner::new(client(&server), KEY, pki.leaf.der.clone(), vec![])
            .await
            .unwrap();

        assert_eq!(signer.key_type(), KeyType::Ec);
        assert_eq!(signer.digest_algorithm(), DigestAlgorithm::Sha256);

        let produced = signer
            .sign(b"signed attributes", DigestAlgorithm::Sha256)
            .await
            .unwrap();
        assert_eq!(produced, signature);

        public_key.assert_async().await;
        sign.assert_async().await;
    }

    #[tokio::test]
    async fn mismatched_certificate_is_fatal() {
        let pki = TestPki::ec("http://localhost");
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(200)
                    .json_body(public_key_json(&pki, "EC_SIGN_P256_SHA256"));
            })
            .await;

        let result =
            KmsSigner::new(client(&server), KEY, pki.intermediate.der.clone(), vec![]).await;
        assert!(matches!(result, Err(KmsSignerError::CertificateMismatch)));
    }

    #[tokio::test]
    async fn other_digests_are_rejected() {
        let pki = TestPki::ec("http://localhost");
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(200)
                    .json_body(public_key_json(&pki, "EC_SIGN_P256_SHA256"));
            })
            .await;

        let signer = KmsSigner::new(client(&server), KEY, pki.leaf.der.clone(), vec![])
            .await
            .unwrap();

        let err = signer
            .sign(b"data", DigestAlgorithm::Sha384)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignerError::Kms(KmsSignerError::DigestMismatch {
                provisioned: DigestAlgorithm::Sha256,
                requested: DigestAlgorithm::Sha384,
            })
        ));
    }

    #[tokio::test]
    async fn http_statuses_are_classified() {
        let pki = TestPki::ec("http://localhost");

        for (status, expected) in [
            (404u16, "NotFound"),
            (403, "PermissionDenied"),
            (401, "PermissionDenied"),
            (429, "Unavailable"),
            (503, "Unavailable"),
        ] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(Method::GET);
                    then.status(status);
                })
                .await;

            let err = KmsSigner::new(client(&server), KEY, pki.leaf.der.clone(), vec![])
                .await
                .err()
                .unwrap();
            let debug = format!("{err:?}");
            assert!(debug.starts_with(expected), "status {status} produced {debug}");
        }
    }
}
