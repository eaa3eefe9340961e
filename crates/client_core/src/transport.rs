use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::{ApiErrorBody, ErrorCode},
    protocol::{CurrentUser, LoginRequest, TokenResponse},
};
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::{ClientError, ClientResult},
    events::{ClientEvent, EventBus},
    session::Session,
};

/// Shared HTTP client: attaches the bearer token and turns a 401 into a
/// cleared session plus a `LoginRequired` event.
pub struct ApiTransport {
    http: Client,
    base_url: String,
    session: Arc<Session>,
    events: EventBus,
}

impl ApiTransport {
    pub fn new(settings: &Settings, session: Arc<Session>, events: EventBus) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self::with_client(
            http,
            settings.api_base_url.clone(),
            session,
            events,
        ))
    }

    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        session: Arc<Session>,
        events: EventBus,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            events,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn authorized(&self, builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.session.token().await?;
        Ok(builder.bearer_auth(token))
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.get(self.url(path)).query(query)).await?;
        let response = request.send().await?;
        let bytes = self.checked(response, true).await?;
        decode(&bytes)
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.post(self.url(path)).json(body)).await?;
        let response = request.send().await?;
        let bytes = self.checked(response, true).await?;
        decode(&bytes)
    }

    /// POST whose response body is not needed.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.post(self.url(path)).json(body)).await?;
        let response = request.send().await?;
        self.checked(response, true).await?;
        Ok(())
    }

    async fn checked(&self, response: Response, authenticated: bool) -> ClientResult<Vec<u8>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        if status == StatusCode::UNAUTHORIZED && authenticated {
            warn!(url = %response.url(), "backend returned 401; clearing session");
            self.session.expire().await?;
            self.events.emit(ClientEvent::LoginRequired);
            return Err(ClientError::Unauthorized);
        }

        let bytes = response.bytes().await.unwrap_or_default();
        let detail = serde_json::from_slice::<ApiErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.message());
        debug!(status = status.as_u16(), ?detail, "backend rejected request");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            code: ErrorCode::from_status(status.as_u16()),
            detail,
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<CurrentUser> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let bytes = self.checked(response, false).await?;
        let token: TokenResponse = decode(&bytes)?;
        self.session.set_token(token.access_token).await?;

        let user = self.current_user().await?;
        info!(username = %user.username, "signed in");
        Ok(user)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.session.clear().await?;
        info!("signed out");
        Ok(())
    }

    /// Who-am-I, cached on the session.
    pub async fn current_user(&self) -> ClientResult<CurrentUser> {
        self.session
            .current_user_or_fetch(|| self.get_json::<CurrentUser, _>("/auth/me", &()))
            .await
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(bytes).map_err(|err| ClientError::Decode(err.to_string()))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
