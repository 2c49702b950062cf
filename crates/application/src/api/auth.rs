//! Login, registration and logout.

use pulse_domain::{ApiError, ApiRequest, ApiResult, TokenGrant};
use serde_json::{Value, json};

use crate::auth::ReauthCoordinator;
use crate::session::SessionController;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

/// Token-issuing endpoints.
///
/// A rejected login comes back as an ordinary 401: with no stored access
/// token it never raises the unauthorized signal.
#[derive(Debug, Clone)]
pub struct AuthApi {
    coordinator: ReauthCoordinator,
    session: SessionController,
}

impl AuthApi {
    /// Creates the endpoint group.
    #[must_use]
    pub const fn new(coordinator: ReauthCoordinator, session: SessionController) -> Self {
        Self {
            coordinator,
            session,
        }
    }

    /// Authenticates with email and password, storing the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ParsingError` if the response has no
    /// token pair.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<TokenGrant> {
        let request = ApiRequest::post(LOGIN_PATH, json!({ "email": email, "password": password }));
        self.issue(&request).await
    }

    /// Creates an account, storing the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ParsingError` if the response has no
    /// token pair.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<TokenGrant> {
        let request = ApiRequest::post(
            REGISTER_PATH,
            json!({ "name": name, "email": email, "password": password }),
        );
        self.issue(&request).await
    }

    /// Forgets the local session. Does not raise the unauthorized signal.
    pub async fn logout(&self) {
        self.session.sign_out().await;
    }

    async fn issue(&self, request: &ApiRequest) -> ApiResult<TokenGrant> {
        let data = self.coordinator.request(request).await?;
        let grant = TokenGrant::from_body(&data).ok_or_else(|| missing_tokens(data))?;

        // A failed write only costs a later sign-in; the caller still gets the grant.
        if let Err(e) = self.coordinator.token_store().store_grant(&grant).await {
            tracing::debug!(error = %e, "session tokens were not persisted");
        }
        self.session.mark_signed_in();
        tracing::info!(path = %request.path, "session established");
        Ok(grant)
    }
}

fn missing_tokens(data: Value) -> ApiError {
    ApiError::parsing_error(200, "response carried no token pair", Some(data))
}
