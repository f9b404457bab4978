use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for requesting a reset OTP.
#[derive(Debug, Deserialize)]
pub struct SendResetOtpRequest {
    pub email: String,
}

/// Request body for consuming a reset OTP.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub data: PublicUser,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
}

/// Bare success envelope, used by logOut.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Success envelope with a human-readable message, used by the reset flow.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

/// Profile attributes returned by the user-data endpoint.
#[derive(Debug, Serialize)]
pub struct UserData {
    pub name: String,
    pub email: String,
}

/// Response for the user-data endpoint.
#[derive(Debug, Serialize)]
pub struct UserDataResponse {
    pub status: String,
    pub data: UserData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_password_request_uses_camel_case_field() {
        let parsed: ResetPasswordRequest = serde_json::from_str(
            r#"{"email":"a@x.com","otp":"123456","newPassword":"new-password"}"#,
        )
        .unwrap();
        assert_eq!(parsed.email, "a@x.com");
        assert_eq!(parsed.otp, "123456");
        assert_eq!(parsed.new_password, "new-password");
    }

    #[test]
    fn auth_response_serialization() {
        let response = AuthResponse {
            status: "Success".into(),
            token: "jwt-token".into(),
            data: PublicUser {
                id: Uuid::new_v4(),
                name: "Test".into(),
                email: "test@example.com".into(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("jwt-token"));
        assert!(json.contains("id"));
        assert!(!json.contains("password"));
    }
}
