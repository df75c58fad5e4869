use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

/// Body of signup and login. Fields are optional so a missing one is a 400
/// with a readable message rather than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Returns (lowercased email, password) when both are present and non-empty.
    pub fn normalized(self) -> Option<(String, String)> {
        let email = self.email?.trim().to_lowercase();
        let password = self.password?;
        if email.is_empty() || password.is_empty() {
            return None;
        }
        Some((email, password))
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: PublicUser,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_trimmed_and_lowercased() {
        let c = Credentials {
            email: Some("  Alice@Example.COM ".into()),
            password: Some("hunter22".into()),
        };
        assert_eq!(
            c.normalized(),
            Some(("alice@example.com".to_string(), "hunter22".to_string()))
        );
    }

    #[test]
    fn credentials_require_both_fields() {
        let no_password = Credentials {
            email: Some("a@example.com".into()),
            password: None,
        };
        assert!(no_password.normalized().is_none());

        let blank_email = Credentials {
            email: Some("   ".into()),
            password: Some("x".into()),
        };
        assert!(blank_email.normalized().is_none());
    }
}
