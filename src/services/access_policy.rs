use crate::models::Role;
use crate::services::auth_service::Claims;
use crate::utils::AppError;

/// Catalog mutations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAction {
    CreateBook,
    UpdateBook,
    DeleteBook,
}

/// Decides whether a role may perform a catalog action.
///
/// One policy instance lives in the application state and every mutating
/// handler goes through it.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, role: Option<Role>, action: CatalogAction) -> bool;
}

/// Admins and staff manage the catalog; students and role-less users do not.
#[derive(Debug, Default, Clone, Copy)]
pub struct RolePolicy;

impl AccessPolicy for RolePolicy {
    fn allows(&self, role: Option<Role>, action: CatalogAction) -> bool {
        match action {
            CatalogAction::CreateBook | CatalogAction::UpdateBook | CatalogAction::DeleteBook => {
                matches!(role, Some(Role::Admin) | Some(Role::Staff))
            }
        }
    }
}

pub fn authorize(
    policy: &dyn AccessPolicy,
    claims: &Claims,
    action: CatalogAction,
) -> Result<(), AppError> {
    if policy.allows(claims.role, action) {
        Ok(())
    } else {
        log::warn!("⛔ {:?} denied for user {} (role: {:?})", action, claims.sub, claims.role);
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}
