use crate::auth::repo_types::User;
use crate::error::AuthError;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, reset_otp_hash, reset_otp_expires_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, reset_otp_hash, reset_otp_expires_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. A unique violation on email
    /// surfaces as `AuthError::Conflict`.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, reset_otp_hash, reset_otp_expires_at, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Store a pending reset code digest and its deadline, replacing any
    /// previously issued code.
    pub async fn set_reset_otp(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_otp_hash = $2, reset_otp_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(otp_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Clear a pending reset code, but only if the stored digest is still the
    /// one we issued. Used to roll back after a failed email delivery without
    /// clobbering a code issued by a concurrent request.
    pub async fn clear_reset_otp_if_matches(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_otp_hash = NULL, reset_otp_expires_at = NULL
            WHERE id = $1 AND reset_otp_hash = $2
            "#,
        )
        .bind(id)
        .bind(otp_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Consume a pending reset code: apply the new password hash and clear the
    /// code in one conditional statement, guarded by digest match and expiry.
    /// Returns false when nothing matched, i.e. the code was already consumed,
    /// replaced, or expired. The single-statement guard is what keeps two
    /// concurrent consumers from both succeeding.
    pub async fn consume_reset_otp(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3, reset_otp_hash = NULL, reset_otp_expires_at = NULL
            WHERE id = $1 AND reset_otp_hash = $2 AND reset_otp_expires_at > now()
            "#,
        )
        .bind(id)
        .bind(otp_hash)
        .bind(new_password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
