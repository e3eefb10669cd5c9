// src/middleware/rbac.rs
//
// Role gates as extractor parameters: a handler that takes
// `RequireRole<OwnerOnly>` cannot be reached by a driver, and the check
// lives in the signature instead of being repeated in the body.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
    fn describe() -> &'static str;
}

pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // auth_middleware runs first and stores the user row; the role in
        // the JWT claims is never consulted here.
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        if !T::allows(user.role) {
            return Err(AppError::Forbidden(format!(
                "This action requires a {} account",
                T::describe()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

pub struct DriverOnly;
impl RoleDef for DriverOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Driver
    }
    fn describe() -> &'static str {
        "driver"
    }
}

pub struct OwnerOnly;
impl RoleDef for OwnerOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Owner
    }
    fn describe() -> &'static str {
        "owner"
    }
}

pub struct ManagerOnly;
impl RoleDef for ManagerOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Manager
    }
    fn describe() -> &'static str {
        "manager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gates_match_their_role() {
        assert!(DriverOnly::allows(UserRole::Driver));
        assert!(!DriverOnly::allows(UserRole::Owner));
        assert!(OwnerOnly::allows(UserRole::Owner));
        assert!(!OwnerOnly::allows(UserRole::Manager));
        assert!(ManagerOnly::allows(UserRole::Manager));
        assert!(!ManagerOnly::allows(UserRole::Driver));
    }
}
