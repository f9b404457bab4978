use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, SendResetOtpRequest, StatusResponse, UserData,
            UserDataResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        otp,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::AuthError,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logOut", post(log_out))
        .route("/auth/sendResetOtp", post(send_reset_otp))
        .route("/auth/resetPassword", post(reset_password))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/data", get(user_data))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        warn!("missing registration fields");
        return Err(AuthError::validation("Missing details"));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AuthError::validation("Invalid email"));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AuthError::validation("Password too short"));
    }

    // Friendly pre-check; the unique constraint on users.email is what
    // actually closes the duplicate-registration race on insert.
    if let Some(_) = User::find_by_email(&state.db, &payload.email).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(AuthError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;

    let user = User::create(&state.db, &payload.name, &payload.email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err(AuthError::Internal(e));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            status: "Success".into(),
            token,
            data: PublicUser {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        warn!("missing login fields");
        return Err(AuthError::validation("Missing details"));
    }

    // Unknown email and wrong password answer identically so responses do
    // not reveal which addresses have accounts.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AuthError::authentication("Invalid credentials"));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AuthError::authentication("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err(AuthError::Internal(e));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        status: "Success".into(),
        token,
    }))
}

/// Sessions are stateless, so logout only tells the client to drop its
/// token; the token itself stays valid until natural expiry.
#[instrument]
pub async fn log_out() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Success".into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn send_reset_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<SendResetOtpRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() {
        warn!("missing email");
        return Err(AuthError::validation("Missing details"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "reset otp for unknown email");
            return Err(AuthError::not_found("User not found"));
        }
    };

    let ttl_minutes = state.config.reset.otp_ttl_minutes;
    let code = otp::generate();
    let otp_hash = otp::digest(&code);
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);

    // Overwrites any previously issued code and restarts the clock.
    User::set_reset_otp(&state.db, user.id, &otp_hash, expires_at).await?;

    let body = format!(
        "Your password reset OTP is {code}. It expires in {ttl_minutes} minutes.\n\
         If you did not request a reset, you can ignore this email."
    );
    if let Err(e) = state
        .mailer
        .send(&user.email, "Password Reset OTP", &body)
        .await
    {
        error!(error = %e, user_id = %user.id, "reset otp delivery failed");
        // Roll back so the record is not left pending a code nobody received.
        if let Err(e) = User::clear_reset_otp_if_matches(&state.db, user.id, &otp_hash).await {
            error!(error = %e, user_id = %user.id, "reset otp rollback failed");
        }
        return Err(AuthError::Notifier("Could not send reset email".into()));
    }

    info!(user_id = %user.id, "reset otp issued");
    Ok(Json(MessageResponse {
        status: "Success".into(),
        message: "OTP sent to your email".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.otp.is_empty() || payload.new_password.is_empty() {
        warn!("missing reset fields");
        return Err(AuthError::validation("Missing details"));
    }

    if payload.new_password.len() < 8 {
        warn!("new password too short");
        return Err(AuthError::validation("Password too short"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "reset for unknown email");
            return Err(AuthError::not_found("User not found"));
        }
    };

    // Classify invalid vs expired for the caller.
    let stored = user
        .reset_otp_hash
        .as_deref()
        .zip(user.reset_otp_expires_at);
    if let Err(e) = otp::check(stored, &payload.otp, OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, error = %e, "reset otp rejected");
        return Err(e);
    }

    let new_hash = hash_password(&payload.new_password)?;

    // Single conditional write: digest match, unexpired, new hash applied and
    // code cleared together. Zero rows means a concurrent consumer or a
    // fresher code won between our read and this write.
    let consumed =
        User::consume_reset_otp(&state.db, user.id, &otp::digest(&payload.otp), &new_hash).await?;
    if !consumed {
        warn!(user_id = %user.id, "reset otp no longer valid");
        return Err(AuthError::InvalidOtp);
    }

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        status: "Success".into(),
        message: "Password reset successful".into(),
    }))
}

#[instrument(skip(state))]
pub async fn user_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDataResponse>, AuthError> {
    let user = match User::find_by_id(&state.db, user_id).await? {
        Some(u) => u,
        None => {
            warn!(user_id = %user_id, "user not found");
            return Err(AuthError::not_found("User not found"));
        }
    };

    Ok(Json(UserDataResponse {
        status: "Success".into(),
        data: UserData {
            name: user.name,
            email: user.email,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn user_data_response_serialization() {
        let response = UserDataResponse {
            status: "Success".into(),
            data: UserData {
                name: "Test".into(),
                email: "test@example.com".into(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Success"));
    }
}
