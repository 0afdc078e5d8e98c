use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::CompanyId;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::MembershipChecker;

/// Reads the `company_members` table maintained by the company service.
pub struct PostgresMembershipChecker {
    pool: PgPool,
}

impl PostgresMembershipChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipChecker for PostgresMembershipChecker {
    async fn is_member(&self, user_id: &UserId, company_id: &CompanyId) -> Result<bool, AuthError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM company_members WHERE company_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(company_id.0)
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Membership query failed: {}", e);
            AuthError::Unavailable(e.to_string())
        })
    }
}
