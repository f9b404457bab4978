use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub name: String,               // display name
    pub email: String,              // user email, unique
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    #[serde(skip_serializing)]
    pub reset_otp_hash: Option<String>, // SHA-256 of the pending reset code
    #[serde(skip_serializing)]
    pub reset_otp_expires_at: Option<OffsetDateTime>, // deadline for the pending code
    pub created_at: OffsetDateTime, // creation timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_serialize() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            reset_otp_hash: Some("deadbeef".into()),
            reset_otp_expires_at: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("reset_otp_hash"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("test@example.com"));
    }
}
