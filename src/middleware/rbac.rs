// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Role, User},
};

/// Privileged operations. Anything not listed here is open to every
/// authenticated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageUsers,
    WriteCatalog,
    DeleteCatalog,
    AdjustStock,
    DeleteCustomer,
    DecideReturns,
    ImportData,
    UpdateSettings,
    GenerateReminders,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ManageUsers => "users:manage",
            Operation::WriteCatalog => "catalog:write",
            Operation::DeleteCatalog => "catalog:delete",
            Operation::AdjustStock => "stock:adjust",
            Operation::DeleteCustomer => "customers:delete",
            Operation::DecideReturns => "returns:decide",
            Operation::ImportData => "import:write",
            Operation::UpdateSettings => "settings:write",
            Operation::GenerateReminders => "reminders:generate",
        }
    }
}

/// Role × operation table, the single source of authorization rules.
pub const POLICY: &[(Operation, &[Role])] = &[
    (Operation::ManageUsers, &[Role::Admin]),
    (Operation::WriteCatalog, &[Role::Admin, Role::Staff]),
    (Operation::DeleteCatalog, &[Role::Admin]),
    (Operation::AdjustStock, &[Role::Admin, Role::Staff]),
    (Operation::DeleteCustomer, &[Role::Admin]),
    (Operation::DecideReturns, &[Role::Admin, Role::Staff]),
    (Operation::ImportData, &[Role::Admin, Role::Staff]),
    (Operation::UpdateSettings, &[Role::Admin]),
    (Operation::GenerateReminders, &[Role::Admin]),
];

pub fn is_allowed(role: Role, operation: Operation) -> bool {
    POLICY
        .iter()
        .find(|(op, _)| *op == operation)
        .is_some_and(|(_, roles)| roles.contains(&role))
}

/// 1. What a permission marker names
pub trait PermissionDef: Send + Sync + 'static {
    const OPERATION: Operation;
}

/// 2. The extractor: resolves to the caller when their role allows `T`
pub struct RequirePermission<T>(pub User, pub PhantomData<T>);

// 3. Evaluated once per request, after the auth guard
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !is_allowed(user.role, T::OPERATION) {
            tracing::warn!(
                user_id = user.id,
                role = user.role.as_str(),
                operation = T::OPERATION.as_str(),
                "permission denied"
            );
            return Err(AppError::Forbidden(T::OPERATION.as_str().to_string()));
        }

        Ok(RequirePermission(user, PhantomData))
    }
}

// ---
// Permission markers
// ---

pub struct PermManageUsers;
impl PermissionDef for PermManageUsers {
    const OPERATION: Operation = Operation::ManageUsers;
}

pub struct PermWriteCatalog;
impl PermissionDef for PermWriteCatalog {
    const OPERATION: Operation = Operation::WriteCatalog;
}

pub struct PermDeleteCatalog;
impl PermissionDef for PermDeleteCatalog {
    const OPERATION: Operation = Operation::DeleteCatalog;
}

pub struct PermAdjustStock;
impl PermissionDef for PermAdjustStock {
    const OPERATION: Operation = Operation::AdjustStock;
}

pub struct PermDeleteCustomer;
impl PermissionDef for PermDeleteCustomer {
    const OPERATION: Operation = Operation::DeleteCustomer;
}

pub struct PermDecideReturns;
impl PermissionDef for PermDecideReturns {
    const OPERATION: Operation = Operation::DecideReturns;
}

pub struct PermImportData;
impl PermissionDef for PermImportData {
    const OPERATION: Operation = Operation::ImportData;
}

pub struct PermUpdateSettings;
impl PermissionDef for PermUpdateSettings {
    const OPERATION: Operation = Operation::UpdateSettings;
}

pub struct PermGenerateReminders;
impl PermissionDef for PermGenerateReminders {
    const OPERATION: Operation = Operation::GenerateReminders;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: 7,
            username: "someone".into(),
            password_hash: String::new(),
            role,
            name: "Someone".into(),
            email: "someone@example.com".into(),
            phone: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_may_do_everything() {
        for (operation, _) in POLICY {
            assert!(is_allowed(Role::Admin, *operation), "{operation:?}");
        }
    }

    #[test]
    fn staff_and_cashier_are_limited() {
        assert!(is_allowed(Role::Staff, Operation::WriteCatalog));
        assert!(is_allowed(Role::Staff, Operation::DecideReturns));
        assert!(!is_allowed(Role::Staff, Operation::DeleteCatalog));
        assert!(!is_allowed(Role::Staff, Operation::UpdateSettings));
        assert!(!is_allowed(Role::Cashier, Operation::WriteCatalog));
        assert!(!is_allowed(Role::Cashier, Operation::ImportData));
        assert!(!is_allowed(Role::Cashier, Operation::ManageUsers));
    }

    #[test]
    fn every_operation_has_a_rule() {
        let operations = [
            Operation::ManageUsers,
            Operation::WriteCatalog,
            Operation::DeleteCatalog,
            Operation::AdjustStock,
            Operation::DeleteCustomer,
            Operation::DecideReturns,
            Operation::ImportData,
            Operation::UpdateSettings,
            Operation::GenerateReminders,
        ];
        for operation in operations {
            assert_eq!(POLICY.iter().filter(|(op, _)| *op == operation).count(), 1);
        }
    }

    #[tokio::test]
    async fn extractor_rejects_insufficient_roles() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedUser(user(Role::Cashier)));
        let denied = RequirePermission::<PermWriteCatalog>::from_request_parts(&mut parts, &()).await;
        assert_eq!(denied.err().map(|e| e.status_code()), Some(StatusCode::FORBIDDEN));

        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedUser(user(Role::Staff)));
        let RequirePermission(caller, _) =
            RequirePermission::<PermWriteCatalog>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller.id, 7);
    }

    #[tokio::test]
    async fn extractor_without_guard_is_unauthorized() {
        let (mut parts, _) = Request::new(()).into_parts();
        let result = RequirePermission::<PermManageUsers>::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err().map(|e| e.status_code()), Some(StatusCode::UNAUTHORIZED));
    }
}
