//! Principal extraction. Authentication itself happens upstream; the platform
//! gateway forwards the verified identity in trusted headers, and every
//! orchestrator entry point receives it as an explicit value.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Freelancer,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "freelancer" => Ok(Role::Freelancer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".to_string()))?;

        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized("malformed x-user-id header".to_string()))?;

        let role = headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("client")
            .parse::<Role>()
            .map_err(AppError::Unauthorized)?;

        Ok(Self { user_id, role })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn extracts_principal_from_headers() {
        let user_id = Uuid::new_v4();
        let map = headers(&[
            ("x-user-id", &user_id.to_string()),
            ("x-user-role", "freelancer"),
        ]);

        let principal = AuthenticatedPrincipal::from_headers(&map).unwrap();
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.role, Role::Freelancer);
        assert!(!principal.is_admin());
    }

    #[test]
    fn role_defaults_to_client() {
        let user_id = Uuid::new_v4();
        let map = headers(&[("x-user-id", &user_id.to_string())]);

        let principal = AuthenticatedPrincipal::from_headers(&map).unwrap();
        assert_eq!(principal.role, Role::Client);
    }

    #[test]
    fn rejects_missing_user_id() {
        let map = headers(&[("x-user-role", "client")]);
        assert!(matches!(
            AuthenticatedPrincipal::from_headers(&map),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn rejects_malformed_user_id() {
        let map = headers(&[("x-user-id", "not-a-uuid")]);
        assert!(matches!(
            AuthenticatedPrincipal::from_headers(&map),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        let user_id = Uuid::new_v4();
        let map = headers(&[("x-user-id", &user_id.to_string()), ("x-user-role", "root")]);
        assert!(matches!(
            AuthenticatedPrincipal::from_headers(&map),
            Err(AppError::Unauthorized(_))
        ));
    }
}
