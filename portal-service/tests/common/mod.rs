use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use portal_service::domain::login::service::LoginService;
use portal_service::inbound::http::router::create_router;
use portal_service::login::errors::IdentityError;
use portal_service::login::errors::LinkError;
use portal_service::login::errors::LoginError;
use portal_service::login::models::AccountId;
use portal_service::login::models::CanonicalEmail;
use portal_service::login::models::Dob;
use portal_service::login::models::Student;
use portal_service::login::models::StudentId;
use portal_service::login::models::TokenPair;
use portal_service::login::ports::IdentityProvider;
use portal_service::login::ports::StudentRepository;
use uuid::Uuid;

/// Test application that spawns a real server over in-memory collaborators
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryStudentRepository>,
    pub identity: Arc<FakeIdentityProvider>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn(students: Vec<Student>) -> Self {
        let repository = Arc::new(InMemoryStudentRepository::new(students));
        let identity = Arc::new(FakeIdentityProvider::new());

        let login_service = Arc::new(LoginService::new(
            Arc::clone(&repository),
            Arc::clone(&identity),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let application = create_router(login_service);
        tokio::spawn(async move { axum::serve(listener, application).await });

        Self {
            address,
            api_client: reqwest::Client::new(),
            repository,
            identity,
        }
    }

    pub fn login(&self) -> reqwest::RequestBuilder {
        self.api_client
            .post(format!("{}/api/portal/login", self.address))
    }
}

/// Build a student row for seeding the in-memory store
pub fn student(roll: &str, register: Option<&str>, dob: &str, is_active: bool) -> Student {
    Student {
        id: StudentId(Uuid::new_v4()),
        roll_number: roll.to_string(),
        register_number: register.map(String::from),
        date_of_birth: Dob::parse(dob).expect("seed DOB must parse"),
        is_active,
        account_id: None,
    }
}

/// In-memory stand-in for the Postgres repository, mirroring its matching
/// and tie-break behavior.
pub struct InMemoryStudentRepository {
    students: Mutex<Vec<Student>>,
    roles: Mutex<Vec<(AccountId, String)>>,
    pub lookup_calls: AtomicUsize,
    pub link_attempts: AtomicUsize,
    pub fail_link: AtomicBool,
}

impl InMemoryStudentRepository {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            students: Mutex::new(students),
            roles: Mutex::new(Vec::new()),
            lookup_calls: AtomicUsize::new(0),
            link_attempts: AtomicUsize::new(0),
            fail_link: AtomicBool::new(false),
        }
    }

    pub fn role_count(&self, account_id: &AccountId) -> usize {
        self.roles
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == account_id)
            .count()
    }

    pub fn linked_account(&self, roll: &str) -> Option<AccountId> {
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.roll_number == roll)
            .and_then(|s| s.account_id)
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn find_by_identifier_and_dob(
        &self,
        identifier: &str,
        dob: &Dob,
    ) -> Result<Option<Student>, LoginError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        let students = self.students.lock().unwrap();
        let mut matches: Vec<&Student> = students
            .iter()
            .filter(|s| {
                s.date_of_birth == *dob
                    && (s.roll_number == identifier
                        || s.register_number.as_deref() == Some(identifier))
            })
            .collect();

        // Same tie-break as the SQL adapter: roll-number match first, then id.
        matches.sort_by_key(|s| (s.roll_number != identifier, s.id.0));

        Ok(matches.first().map(|s| (*s).clone()))
    }

    async fn link_account(
        &self,
        student_id: &StudentId,
        account_id: &AccountId,
    ) -> Result<(), LinkError> {
        self.link_attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_link.load(Ordering::SeqCst) {
            return Err(LinkError::UpdateFailed {
                student_id: student_id.to_string(),
                account_id: account_id.to_string(),
                reason: "simulated store failure".to_string(),
            });
        }

        let mut students = self.students.lock().unwrap();
        if let Some(student) = students.iter_mut().find(|s| s.id == *student_id) {
            student.account_id = Some(*account_id);
        }
        Ok(())
    }

    async fn has_role(&self, account_id: &AccountId, role: &str) -> Result<bool, LoginError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .any(|(id, r)| id == account_id && r == role))
    }

    async fn grant_role(&self, account_id: &AccountId, role: &str) -> Result<(), LoginError> {
        let mut roles = self.roles.lock().unwrap();
        if !roles.iter().any(|(id, r)| id == account_id && r == role) {
            roles.push((*account_id, role.to_string()));
        }
        Ok(())
    }
}

/// In-memory stand-in for the backing identity provider
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, (AccountId, String)>>,
    pub create_calls: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn account_for(&self, email: &str) -> Option<AccountId> {
        self.accounts.lock().unwrap().get(email).map(|(id, _)| *id)
    }

    /// Seed an account as if a prior login had partially provisioned it
    pub fn seed_account(&self, email: &str, password: &str) -> AccountId {
        let account_id = AccountId(Uuid::new_v4());
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (account_id, password.to_string()));
        account_id
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_account(
        &self,
        email: &CanonicalEmail,
        password: &str,
        _roll_number: &str,
    ) -> Result<AccountId, IdentityError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email.as_str()) {
            return Err(IdentityError::AlreadyExists);
        }

        let account_id = AccountId(Uuid::new_v4());
        accounts.insert(email.as_str().to_string(), (account_id, password.to_string()));
        Ok(account_id)
    }

    async fn find_account_by_email(
        &self,
        email: &CanonicalEmail,
    ) -> Result<Option<AccountId>, IdentityError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(email.as_str())
            .map(|(id, _)| *id))
    }

    async fn issue_tokens(
        &self,
        email: &CanonicalEmail,
        password: &str,
    ) -> Result<TokenPair, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email.as_str()) {
            Some((account_id, stored)) if stored == password => Ok(TokenPair {
                access_token: format!("access-{account_id}"),
                refresh_token: format!("refresh-{account_id}"),
                token_type: "bearer".to_string(),
                expires_in: 3600,
                extra: serde_json::Map::new(),
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }
}
