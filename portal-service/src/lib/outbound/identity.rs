use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::login::errors::IdentityError;
use crate::login::models::AccountId;
use crate::login::models::CanonicalEmail;
use crate::login::models::TokenPair;
use crate::login::ports::IdentityProvider;

/// HTTP adapter for the backing identity provider's admin and token APIs.
pub struct HttpIdentityProvider {
    client: Client,
    config: IdentityConfig,
}

impl HttpIdentityProvider {
    pub fn new(client: Client, config: IdentityConfig) -> Self {
        Self { client, config }
    }

    fn admin_users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.config.url)
    }
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountList {
    users: Vec<AccountRecord>,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_account(
        &self,
        email: &CanonicalEmail,
        password: &str,
        roll_number: &str,
    ) -> Result<AccountId, IdentityError> {
        let response = self
            .client
            .post(self.admin_users_url())
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .json(&json!({
                "email": email.as_str(),
                "password": password,
                "email_confirm": true,
                "user_metadata": {
                    "portal": "student",
                    "roll_number": roll_number,
                },
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let account: AccountRecord = response
                .json()
                .await
                .map_err(|e| IdentityError::Transport(e.to_string()))?;
            return Ok(AccountId(account.id));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            return Err(IdentityError::AlreadyExists);
        }

        Err(IdentityError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }

    async fn find_account_by_email(
        &self,
        email: &CanonicalEmail,
    ) -> Result<Option<AccountId>, IdentityError> {
        let response = self
            .client
            .get(self.admin_users_url())
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let list: AccountList = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(list
            .users
            .into_iter()
            .find(|account| account.email.as_deref() == Some(email.as_str()))
            .map(|account| AccountId(account.id)))
    }

    async fn issue_tokens(
        &self,
        email: &CanonicalEmail,
        password: &str,
    ) -> Result<TokenPair, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.config.url);

        let response = self
            .client
            .post(url)
            .header("apikey", self.config.token_api_key())
            .json(&json!({
                "email": email.as_str(),
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| IdentityError::Transport(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), body = %body, "Token grant rejected");

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::InvalidCredentials);
        }

        Err(IdentityError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}
