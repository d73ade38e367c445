use async_trait::async_trait;

use crate::login::errors::IdentityError;
use crate::login::errors::LinkError;
use crate::login::errors::LoginError;
use crate::login::models::AccountId;
use crate::login::models::CanonicalEmail;
use crate::login::models::Dob;
use crate::login::models::LoginCommand;
use crate::login::models::Student;
use crate::login::models::StudentId;
use crate::login::models::TokenPair;

/// Role granted to provisioned student accounts
pub const STUDENT_ROLE: &str = "student";

/// Port for the login domain service.
#[async_trait]
pub trait LoginServicePort: Send + Sync + 'static {
    /// Exchange a validated (identifier, date-of-birth) pair for a session,
    /// provisioning the backing account and role on first use.
    ///
    /// # Arguments
    /// * `command` - Validated command with portal, identifier, and DOB
    ///
    /// # Returns
    /// Token pair issued by the identity provider
    ///
    /// # Errors
    /// * `InvalidStudent` - No student matches identifier and DOB
    /// * `NotActivated` - Student matched but portal access is disabled
    /// * `Provisioning` - Backing account could not be created or resolved
    /// * `InvalidLogin` - Identity provider rejected the token exchange
    /// * `Database` - Backing store operation failed
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, LoginError>;
}

/// Persistence operations for student records and role assignments.
#[async_trait]
pub trait StudentRepository: Send + Sync + 'static {
    /// Find the student whose roll number OR register number equals the
    /// identifier and whose date of birth matches.
    ///
    /// When the identifier hits one student's roll number and another's
    /// register number, the roll-number match wins; remaining ties break on
    /// lowest id. The tie-break is part of the contract, not an accident of
    /// result ordering.
    ///
    /// # Arguments
    /// * `identifier` - Trimmed roll or register number
    /// * `dob` - Canonical date of birth
    ///
    /// # Returns
    /// Matching student, or None
    ///
    /// # Errors
    /// * `Database` - Backing store operation failed
    async fn find_by_identifier_and_dob(
        &self,
        identifier: &str,
        dob: &Dob,
    ) -> Result<Option<Student>, LoginError>;

    /// Record the backing account on the student row.
    ///
    /// Best-effort: the caller logs a failure and proceeds with the login.
    ///
    /// # Arguments
    /// * `student_id` - Student to update
    /// * `account_id` - Provisioned backing account
    ///
    /// # Errors
    /// * `UpdateFailed` - Store rejected the update
    async fn link_account(
        &self,
        student_id: &StudentId,
        account_id: &AccountId,
    ) -> Result<(), LinkError>;

    /// Check whether the account already holds a role.
    ///
    /// # Errors
    /// * `Database` - Backing store operation failed
    async fn has_role(&self, account_id: &AccountId, role: &str) -> Result<bool, LoginError>;

    /// Grant a role to an account. Safe to call when the row already exists.
    ///
    /// # Errors
    /// * `Database` - Backing store operation failed
    async fn grant_role(&self, account_id: &AccountId, role: &str) -> Result<(), LoginError>;
}

/// Operations against the backing identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Create a pre-confirmed account with the canonical email and password.
    ///
    /// # Arguments
    /// * `email` - Canonical student email
    /// * `password` - Canonical DOB string
    /// * `roll_number` - Stored as account metadata
    ///
    /// # Returns
    /// Identifier of the created account
    ///
    /// # Errors
    /// * `AlreadyExists` - An account with this email exists
    /// * `Transport` / `UnexpectedStatus` - Provider call failed
    async fn create_account(
        &self,
        email: &CanonicalEmail,
        password: &str,
        roll_number: &str,
    ) -> Result<AccountId, IdentityError>;

    /// Look up an existing account by its canonical email.
    ///
    /// # Returns
    /// Account identifier, or None
    ///
    /// # Errors
    /// * `Transport` / `UnexpectedStatus` - Provider call failed
    async fn find_account_by_email(
        &self,
        email: &CanonicalEmail,
    ) -> Result<Option<AccountId>, IdentityError>;

    /// Exchange email and password for a session via the password grant.
    ///
    /// # Returns
    /// Raw token payload from the provider
    ///
    /// # Errors
    /// * `InvalidCredentials` - Provider rejected the credentials
    /// * `Transport` / `UnexpectedStatus` - Provider call failed
    async fn issue_tokens(
        &self,
        email: &CanonicalEmail,
        password: &str,
    ) -> Result<TokenPair, IdentityError>;
}
