use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ExternalId;
use crate::domain::user::models::ProfileFields;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

const USER_COLUMNS: &str = "id, name, email, password_hash, external_id, profile_picture, \
                            is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Option<String>,
    external_id: Option<String>,
    profile_picture: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        // A row that no longer satisfies the value objects is a storage fault
        let corrupt = |e: &dyn std::fmt::Display| {
            tracing::error!(user_id = %id, "Corrupt user record: {}", e);
            AuthError::Unavailable(format!("Corrupt user record: {}", e))
        };

        let external_id = row
            .external_id
            .map(ExternalId::new)
            .transpose()
            .map_err(|e| corrupt(&e))?;
        let credentials =
            Credentials::from_parts(row.password_hash, external_id).map_err(|e| corrupt(&e))?;

        Ok(User {
            id: UserId(row.id),
            name: DisplayName::new(row.name).map_err(|e| corrupt(&e))?,
            email: EmailAddress::new(row.email).map_err(|e| corrupt(&e))?,
            credentials,
            profile_picture: row.profile_picture,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    tracing::error!("User query failed: {}", e);
    AuthError::Unavailable(e.to_string())
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        bind: impl for<'q> sqlx::Encode<'q, sqlx::Postgres>
            + sqlx::Type<sqlx::Postgres>
            + Send
            + 'static,
    ) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, condition);

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, external_id, profile_picture,
                               is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_hash())
        .bind(user.external_id().map(|id| id.as_str()))
        .bind(user.profile_picture.as_deref())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("users_external_id_key") {
                        return AuthError::IdentityConflict;
                    }
                    return AuthError::UserAlreadyExists;
                }
            }
            database_error(e)
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("id = $1", id.0).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("LOWER(email) = LOWER($1)", email.as_str().to_string())
            .await
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("external_id = $1", external_id.as_str().to_string())
            .await
    }

    async fn link_external_identity(
        &self,
        id: &UserId,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError> {
        let sql = format!(
            "UPDATE users SET external_id = $2, updated_at = NOW() \
             WHERE id = $1 AND external_id IS NULL RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(external_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_err) if db_err.is_unique_violation() => AuthError::IdentityConflict,
                _ => database_error(e),
            })?
            .map(User::try_from)
            .transpose()
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(AuthError::UserNotFound)
            .and_then(User::try_from)
    }

    async fn update_profile_fields(
        &self,
        id: &UserId,
        fields: ProfileFields,
    ) -> Result<User, AuthError> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), \
             profile_picture = COALESCE($3, profile_picture), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(fields.name.as_ref().map(|name| name.as_str()))
            .bind(fields.profile_picture.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(AuthError::UserNotFound)
            .and_then(User::try_from)
    }
}
