/// Authentication extractors and utilities
use crate::{
    account::ValidatedSession,
    admin::Role,
    api::middleware::extract_session_token,
    context::AppContext,
    error::PortalError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Admin authentication context - requires a live admin session
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub token: String,
    pub session: ValidatedSession,
    pub role: Option<Role>,
}

impl AdminAuthContext {
    /// Name recorded on inventory movements and finance records
    pub fn actor(&self) -> String {
        self.session
            .username
            .clone()
            .unwrap_or_else(|| self.session.role_name.clone())
    }

    /// Unknown roles can act as nothing
    pub fn can_act_as(&self, required: Role) -> bool {
        self.role.is_some_and(|role| role.can_act_as(required))
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers)
            .ok_or_else(|| PortalError::Authentication("Unauthorized".to_string()))?;

        let session = state.admin_manager.validate_session(&token).await?;
        let role = session.role;

        tracing::debug!(
            "AdminAuthContext: session {} as {}",
            session.session_id,
            session.role_name
        );

        Ok(AdminAuthContext {
            token,
            session,
            role,
        })
    }
}

/// Macro to require specific admin role
/// Usage: require_admin_role!(auth, Role::SuperAdmin);
#[macro_export]
macro_rules! require_admin_role {
    ($auth:expr, $required:expr) => {
        if !$auth.can_act_as($required) {
            return Err($crate::error::PortalError::Authorization(format!(
                "Forbidden: {} access required",
                $required.label()
            )));
        }
    };
}
