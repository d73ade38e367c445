use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::login::errors::LinkError;
use crate::login::errors::LoginError;
use crate::login::models::AccountId;
use crate::login::models::Dob;
use crate::login::models::Student;
use crate::login::models::StudentId;
use crate::login::ports::StudentRepository;

pub struct PostgresStudentRepository {
    pool: PgPool,
}

impl PostgresStudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: Uuid,
    roll_number: String,
    register_number: Option<String>,
    date_of_birth: NaiveDate,
    is_active: bool,
    user_id: Option<Uuid>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: StudentId(row.id),
            roll_number: row.roll_number,
            register_number: row.register_number,
            date_of_birth: Dob::from(row.date_of_birth),
            is_active: row.is_active,
            account_id: row.user_id.map(AccountId),
        }
    }
}

#[async_trait]
impl StudentRepository for PostgresStudentRepository {
    async fn find_by_identifier_and_dob(
        &self,
        identifier: &str,
        dob: &Dob,
    ) -> Result<Option<Student>, LoginError> {
        // Roll-number matches take precedence over register-number matches;
        // remaining ties break on lowest id.
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, roll_number, register_number, date_of_birth, is_active, user_id
            FROM students
            WHERE (roll_number = $1 OR register_number = $1)
              AND date_of_birth = $2
            ORDER BY (roll_number = $1) DESC, id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .bind(dob.date())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?;

        Ok(row.map(Student::from))
    }

    async fn link_account(
        &self,
        student_id: &StudentId,
        account_id: &AccountId,
    ) -> Result<(), LinkError> {
        sqlx::query("UPDATE students SET user_id = $2 WHERE id = $1")
            .bind(student_id.0)
            .bind(account_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| LinkError::UpdateFailed {
                student_id: student_id.to_string(),
                account_id: account_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn has_role(&self, account_id: &AccountId, role: &str) -> Result<bool, LoginError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(account_id.0)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?;

        Ok(exists)
    }

    async fn grant_role(&self, account_id: &AccountId, role: &str) -> Result<(), LoginError> {
        // The unique constraint backstops the check-then-insert under
        // concurrent first logins.
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(account_id.0)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?;

        Ok(())
    }
}
