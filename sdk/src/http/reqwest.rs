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

#[cfg(feature = "http_reqwest")]
mod async_impl {
    use async_trait::async_trait;
    use http::{Request, Response};

    use crate::http::{AsyncHttpResolver, HttpResolverError, ResponseLimit};

    #[async_trait]
    impl AsyncHttpResolver for reqwest::Client {
        async fn http_resolve_async(
            &self,
            request: Request<Vec<u8>>,
        ) -> Result<Response<Vec<u8>>, HttpResolverError> {
            let limit = request.extensions().get::<ResponseLimit>().map(|l| l.0);
            let uri = request.uri().to_string();
            let too_large = |limit| HttpResolverError::ResponseTooLarge {
                uri: uri.clone(),
                limit,
            };

            let mut response = self.execute(request.try_into()?).await?;

            if let (Some(limit), Some(length)) = (limit, response.content_length()) {
                if length > limit as u64 {
                    return Err(too_large(limit));
                }
            }

            let mut builder = Response::builder()
                .status(response.status())
                .version(response.version());

            for (name, value) in response.headers().iter() {
                builder = builder.header(name, value);
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                if let Some(limit) = limit {
                    if body.len() + chunk.len() > limit {
                        return Err(too_large(limit));
                    }
                }
                body.extend_from_slice(&chunk);
            }

            Ok(builder.body(body)?)
        }
    }

    impl From<reqwest::Error> for HttpResolverError {
        fn from(value: reqwest::Error) -> Self {
            Self::Other(Box::new(value))
        }
    }

}
