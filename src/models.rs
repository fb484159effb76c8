use serde::{Deserialize, Serialize};

/// The single principal allowed to log in.
#[derive(Debug, Clone)]
pub struct Principal {
    pub identity: String,
    pub secret: String,
}

impl Principal {
    pub fn member() -> Self {
        Self {
            identity: "user@example.com".to_string(),
            secret: "password123".to_string(),
        }
    }
}

/// Missing fields deserialize as empty strings and simply fail verification.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

/// Roles carried in a token. Only `Admin` passes the request gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "name")]
    pub identity: String,
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let viewer: Role = serde_json::from_str(r#""viewer""#).unwrap();
        assert_eq!(viewer, Role::Viewer);
        assert!(serde_json::from_str::<Role>(r#""root""#).is_err());
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims {
            identity: "user@example.com".to_string(),
            role: Role::Admin,
            exp: 1_700_000_000,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["name"], "user@example.com");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["exp"], 1_700_000_000);
    }

    #[test]
    fn test_login_request_missing_fields_default_empty() {
        let req: LoginRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(req.email, "a@b.c");
        assert!(req.password.is_empty());
    }
}
