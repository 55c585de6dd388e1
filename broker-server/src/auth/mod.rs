//! JWT authentication for the broker API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

use crate::state::AppState;

/// JWT claims for broker API authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID (buyer, supplier or admin)
    pub sub: i64,
    /// Role: admin | supplier | buyer
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated identity extracted from JWT
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub subject_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role != Role::Admin {
            return Err(AppError::new(ErrorCode::AdminRequired));
        }
        Ok(())
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::new(ErrorCode::RoleRequired));
        }
        Ok(())
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for an account
pub fn create_token(
    subject_id: i64,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: subject_id,
        role: role.as_str().to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware that extracts and verifies the JWT from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format"))?;

    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        unauthorized("Invalid or expired token")
    })?;

    let role: Role = match token_data.claims.role.parse() {
        Ok(role) => role,
        Err(_) => return Err(unauthorized("Unknown role")),
    };

    let identity = Identity {
        subject_id: token_data.claims.sub,
        role,
    };

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn unauthorized(message: &str) -> Response {
    AppError::with_message(ErrorCode::NotAuthenticated, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token(42, Role::Supplier, "test-secret").unwrap();
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 42);
        assert_eq!(data.claims.role, "supplier");
    }
}
