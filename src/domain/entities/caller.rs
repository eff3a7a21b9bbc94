use uuid::Uuid;

use super::user_role::UserRole;

/// Identity of whoever is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caller {
    pub user_id: Option<Uuid>,
    pub role: UserRole,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }
}
