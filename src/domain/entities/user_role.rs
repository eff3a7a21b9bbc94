use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Authorization level of a caller, ordered from least to most privileged.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UserRole {
    #[default]
    Anonymous,
    NormalUser,
    TenantAdmin,
    SuperAdmin,
}

impl UserRole {
    pub fn is_at_least(&self, required: UserRole) -> bool {
        *self >= required
    }
}
