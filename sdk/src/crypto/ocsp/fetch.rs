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

use super::{build_ocsp_request, make_ocsp_cert_id, OcspError, OcspResponse};
use crate::{certificate::Certificate, crypto::hash::DigestAlgorithm, http::HttpClient};

const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";
const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// Retrieve an OCSP response for `cert`.
///
/// Each responder named in the certificate's AIA extension is tried in turn
/// with an HTTP POST; the first usable response wins. The error of the last
/// responder is returned when none succeeds.
pub(crate) async fn fetch_ocsp_response(
    http: &HttpClient,
    cert: &Certificate,
    issuer: &Certificate,
    cert_id_hash: DigestAlgorithm,
) -> Result<OcspResponse, OcspError> {
    let cert_id = make_ocsp_cert_id(cert, issuer, cert_id_hash)?;
    let request = build_ocsp_request(cert_id.clone())?;

    let mut last_error = OcspError::NoResponder;

    for url in cert.ocsp_urls() {
        let result = http
            .post(
                url,
                OCSP_REQUEST_CONTENT_TYPE,
                OCSP_RESPONSE_CONTENT_TYPE,
                request.clone(),
            )
            .await
            .map_err(OcspError::from)
            .and_then(|body| OcspResponse::from_der(&body, &cert_id));

        match result {
            Ok(response) => {
                log::debug!("OCSP response from {url} ({} bytes)", response.ocsp_der.len());
                return Ok(response);
            }
            Err(err) => {
                log::debug!("OCSP responder {url} unusable: {err}");
                last_error = err;
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use httpmock::{Method, MockServer};
    use rasn_ocsp::OcspResponseStatus;

    use super::*;
    use crate::{
        http::AsyncGenericResolver,
        settings::Network,
        tests::fixtures::{self, TestPki},
    };

    #[tokio::test]
    async fn posts_request_and_reads_response() {
        let server = MockServer::start_async().await;
        let pki = TestPki::ec(&server.base_url());

        let leaf = Certificate::from_der(&pki.leaf.der).unwrap();
        let issuer = Certificate::from_der(&pki.intermediate.der).unwrap();
        let cert_id = make_ocsp_cert_id(&leaf, &issuer, DigestAlgorithm::Sha1).unwrap();
        let body = fixtures::ocsp::good_response(&pki.intermediate, &cert_id, &[]);

        let mock = server
            .mock_async(|when, then| {
                when.method(Method::POST)
                    .path("/ocsp")
                    .header("content-type", OCSP_REQUEST_CONTENT_TYPE)
                    .header("accept", OCSP_RESPONSE_CONTENT_TYPE);
                then.status(200).body(&body);
            })
            .await;

        let http = HttpClient::new(Arc::new(AsyncGenericResolver::new()), &Network::default());
        let response = fetch_ocsp_response(&http, &leaf, &issuer, DigestAlgorithm::Sha1)
            .await
            .unwrap();

        assert_eq!(response.ocsp_der, body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn try_later_is_not_a_response() {
        let server = MockServer::start_async().await;
        let pki = TestPki::ec(&server.base_url());

        server
            .mock_async(|when, then| {
                when.method(Method::POST).path("/ocsp");
                then.status(200)
                    .body(fixtures::ocsp::status_only_response(OcspResponseStatus::TryLater));
            })
            .await;

        let http = HttpClient::new(Arc::new(AsyncGenericResolver::new()), &Network::default());
        let err = fetch_ocsp_response(
            &http,
            &Certificate::from_der(&pki.leaf.der).unwrap(),
            &Certificate::from_der(&pki.intermediate.der).unwrap(),
            DigestAlgorithm::Sha1,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OcspError::Unsuccessful(_)));
    }

    #[tokio::test]
    async fn certificate_without_responder() {
        let pki = TestPki::ec("http://localhost");
        let http = HttpClient::new(Arc::new(AsyncGenericResolver::new()), &Network::default());

        // Roots carry no AIA extension.
        let root = Certificate::from_der(&pki.root.der).unwrap();
        let err = fetch_ocsp_response(&http, &root, &root, DigestAlgorithm::Sha1)
            .await
            .unwrap_err();

        assert!(matches!(err, OcspError::NoResponder));
    }
}
