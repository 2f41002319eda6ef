use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use flightdeck_core::repository::{NewUser, UserRepository};
use flightdeck_core::users::User;
use flightdeck_core::{DomainError, DomainResult};

use crate::database::is_unique_violation;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    is_staff: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, is_staff, created_at";

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, new_user: NewUser) -> DomainResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, password_hash, is_staff)
             VALUES ($1, $2, $3, $4)
             RETURNING id, email, password_hash, is_staff, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DomainError::Conflict("email")
            } else {
                DomainError::storage(err)
            }
        })?;

        Ok(row.into())
    }

    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(User::from))
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> DomainResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users
             SET email = COALESCE($2, email),
                 password_hash = COALESCE($3, password_hash)
             WHERE id = $1
             RETURNING id, email, password_hash, is_staff, created_at",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DomainError::Conflict("email")
            } else {
                DomainError::storage(err)
            }
        })?
        .ok_or(DomainError::NotFound("user"))?;

        Ok(row.into())
    }
}
