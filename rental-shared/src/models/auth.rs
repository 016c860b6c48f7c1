use serde::{Deserialize, Serialize};

use crate::pii::Masked;

/// Email/password pair forwarded to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: Masked<String>,
}

impl Credentials {
    pub fn is_blank(&self) -> bool {
        self.email.trim().is_empty() || self.password.0.is_empty()
    }
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: Masked<String>,
}
