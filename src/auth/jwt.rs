use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::claims::MemberClaims;

pub fn validate_jwt(token: &str, secret: &str) -> Result<MemberClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<MemberClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| format!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Sign a member token. Used by tests and local tooling.
#[cfg(test)]
pub fn issue_jwt(member_id: i32, secret: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = MemberClaims {
        sub: member_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("failed to sign test token")
}
