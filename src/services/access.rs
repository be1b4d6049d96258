// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization checks on a loaded user profile.

use crate::error::AppError;
use crate::models::{Contribution, User};

/// Inactive users may sign in and read their own profile, nothing else.
pub fn ensure_active(profile: &User) -> Result<(), AppError> {
    if profile.is_active {
        Ok(())
    } else {
        Err(AppError::InactiveUser)
    }
}

/// Admins must also be active; a deactivated admin has no privileges.
pub fn ensure_admin(profile: &User) -> Result<(), AppError> {
    ensure_active(profile)?;
    if profile.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin privileges required".to_string()))
    }
}

/// Contributions are edited by their owner or an admin.
pub fn ensure_can_edit_contribution(
    profile: &User,
    contribution: &Contribution,
) -> Result<(), AppError> {
    ensure_active(profile)?;
    if profile.is_admin || contribution.user_id == profile.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only the buyer or an admin can edit this contribution".to_string(),
        ))
    }
}

/// Users record their own purchases; admins may record on behalf of anyone.
pub fn ensure_can_record_for(profile: &User, target_user_id: &str) -> Result<(), AppError> {
    ensure_active(profile)?;
    if profile.is_admin || target_user_id == profile.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only admins can record purchases for other users".to_string(),
        ))
    }
}
