use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{api_state::ApiState, error::ApiError};

/// Bearer-token claims. `sub` carries the application user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

pub async fn jwt_auth(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("You have to be authenticated".to_string()))?;

    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_ref()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "JWT validation failed");
        ApiError::Unauthorized("You have to be authenticated".to_string())
    })?;

    request.extensions_mut().insert(token_data.claims);

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    #[test]
    fn claims_round_trip_through_hs256() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "user@example.com".to_string(),
            exp: usize::MAX,
        };
        let secret = "test-secret";

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .expect("token encodes");

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("token decodes");

        assert_eq!(decoded.claims.sub, "user-1");
        assert_eq!(decoded.claims.email, "user@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "user@example.com".to_string(),
            exp: usize::MAX,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret-a"),
        )
        .expect("token encodes");

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret-b"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
