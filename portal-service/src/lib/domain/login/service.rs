use std::sync::Arc;

use async_trait::async_trait;

use crate::login::errors::IdentityError;
use crate::login::errors::LoginError;
use crate::login::models::AccountId;
use crate::login::models::CanonicalEmail;
use crate::login::models::LoginCommand;
use crate::login::models::Student;
use crate::login::models::TokenPair;
use crate::login::ports::IdentityProvider;
use crate::login::ports::LoginServicePort;
use crate::login::ports::StudentRepository;
use crate::login::ports::STUDENT_ROLE;

/// Domain service implementing the alternate-credential login flow.
///
/// Concrete implementation of LoginServicePort with dependency injection.
pub struct LoginService<SR, IP>
where
    SR: StudentRepository,
    IP: IdentityProvider,
{
    repository: Arc<SR>,
    identity: Arc<IP>,
}

impl<SR, IP> LoginService<SR, IP>
where
    SR: StudentRepository,
    IP: IdentityProvider,
{
    /// Create a new login service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Student and role persistence implementation
    /// * `identity` - Backing identity provider implementation
    pub fn new(repository: Arc<SR>, identity: Arc<IP>) -> Self {
        Self {
            repository,
            identity,
        }
    }

    /// Resolve the backing account for a first login.
    ///
    /// Creation races are tolerated: if the provider reports the email as
    /// taken, the existing account is looked up instead of failing the
    /// request.
    async fn provision_account(
        &self,
        student: &Student,
        email: &CanonicalEmail,
        password: &str,
    ) -> Result<AccountId, LoginError> {
        let account_id = match self
            .identity
            .create_account(email, password, &student.roll_number)
            .await
        {
            Ok(account_id) => account_id,
            Err(create_err) => {
                tracing::warn!(
                    student_id = %student.id,
                    email = %email,
                    error = %create_err,
                    "Account creation failed, resolving existing account"
                );
                match self.identity.find_account_by_email(email).await {
                    Ok(Some(account_id)) => account_id,
                    Ok(None) => {
                        tracing::error!(
                            student_id = %student.id,
                            email = %email,
                            error = %create_err,
                            "Account neither created nor found"
                        );
                        return Err(LoginError::Provisioning(create_err.to_string()));
                    }
                    Err(lookup_err) => {
                        tracing::error!(
                            student_id = %student.id,
                            email = %email,
                            error = %lookup_err,
                            "Account lookup failed after failed creation"
                        );
                        return Err(LoginError::Provisioning(lookup_err.to_string()));
                    }
                }
            }
        };

        // Best-effort back-reference; a failure here is logged and the login
        // still proceeds. The derived email keeps retries consistent.
        if let Err(link_err) = self.repository.link_account(&student.id, &account_id).await {
            tracing::warn!(
                student_id = %student.id,
                account_id = %account_id,
                error = %link_err,
                "Failed to link student to backing account"
            );
        }

        if !self.repository.has_role(&account_id, STUDENT_ROLE).await? {
            self.repository.grant_role(&account_id, STUDENT_ROLE).await?;
        }

        Ok(account_id)
    }
}

#[async_trait]
impl<SR, IP> LoginServicePort for LoginService<SR, IP>
where
    SR: StudentRepository,
    IP: IdentityProvider,
{
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, LoginError> {
        let student = self
            .repository
            .find_by_identifier_and_dob(&command.identifier, &command.dob)
            .await?
            .ok_or(LoginError::InvalidStudent)?;

        if !student.is_active {
            tracing::info!(student_id = %student.id, "Login refused, portal not activated");
            return Err(LoginError::NotActivated);
        }

        let email = CanonicalEmail::for_student(&student.roll_number);
        let password = command.dob.canonical();

        if student.account_id.is_none() {
            let account_id = self.provision_account(&student, &email, &password).await?;
            tracing::info!(
                student_id = %student.id,
                account_id = %account_id,
                "Provisioned backing account on first login"
            );
        }

        self.identity
            .issue_tokens(&email, &password)
            .await
            .map_err(|e| match e {
                // Only a provider-level rejection reads as bad credentials;
                // a failure to reach the provider at all is an outage.
                IdentityError::Transport(reason) => {
                    tracing::error!(error = %reason, "Token exchange did not complete");
                    LoginError::Unknown(reason)
                }
                other => {
                    tracing::error!(error = %other, "Token exchange rejected");
                    LoginError::InvalidLogin
                }
            })
    }
}
