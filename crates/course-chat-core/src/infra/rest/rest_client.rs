// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use reqwest::{RequestBuilder, Response};
use secrecy::ExposeSecret;
use url::Url;

use crate::app::deps::DynAppContext;

/// Shared plumbing of the REST adapters. Requests are authorized with the access token of the
/// active credentials, if any.
#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    ctx: DynAppContext,
}

#[derive(Debug)]
pub(crate) enum RestError {
    Network(String),
    Status { status: u16, body: String },
    Decode(String),
}

impl RestClient {
    pub fn new(http: reqwest::Client, base_url: Url, ctx: DynAppContext) -> Self {
        Self {
            http,
            base_url,
            ctx,
        }
    }

    /// Appends `segments` to the base url, percent-encoding each of them.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self
            .ctx
            .credentials(|credentials| credentials.access_token.expose_secret().clone())
        {
            Ok(token) => request.bearer_auth(token),
            Err(_) => request,
        }
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response, RestError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| RestError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RestError::Status {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RestError> {
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|err| RestError::Network(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| RestError::Decode(err.to_string()))
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
