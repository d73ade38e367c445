use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::inbound::http::router::AppState;
use crate::login::errors::LoginError;
use crate::login::models::Dob;
use crate::login::models::LoginCommand;
use crate::login::models::PortalType;
use crate::login::models::TokenPair;

pub async fn portal_login(
    State(state): State<AppState>,
    body: Option<Json<PortalLoginRequest>>,
) -> Result<Json<TokenPair>, ApiError> {
    // An absent, unparsable, or mistyped body is treated as the empty
    // request, which fails the portal check below with the same envelope as
    // every other error.
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let command = body.try_into_command()?;

    let tokens = state.login_service.login(command).await?;

    // Token payload is passed through to the client unchanged.
    Ok(Json(tokens))
}

/// HTTP request body for a portal login (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PortalLoginRequest {
    #[serde(rename = "portalType", default)]
    portal_type: String,
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    dob: String,
}

impl PortalLoginRequest {
    fn try_into_command(self) -> Result<LoginCommand, LoginError> {
        // Portal check comes first: a bad portal is 400 regardless of the
        // other fields.
        let portal = PortalType::parse(&self.portal_type)?;

        let identifier = self.identifier.trim().to_string();
        if identifier.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let dob = Dob::parse(&self.dob)?;

        Ok(LoginCommand {
            portal,
            identifier,
            dob,
        })
    }
}
