use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemberClaims {
    pub sub: String, // Member id as a decimal string
    pub exp: i64,
    pub iat: i64,
}

impl MemberClaims {
    pub fn member_id(&self) -> Result<i32, String> {
        self.sub
            .parse::<i32>()
            .map_err(|_| format!("Subject is not a member id: {}", self.sub))
    }
}
