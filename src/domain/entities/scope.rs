use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Scope that additionally authorizes logging in through the provider.
pub const AUTH_SCOPE: &str = "auth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFlag {
    pub name: String,
    pub enabled: bool,
}

impl ScopeFlag {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

/// Ordered scope flags with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScopeFlag>", into = "Vec<ScopeFlag>")]
pub struct ScopeSet(Vec<ScopeFlag>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeSetError {
    #[error("Duplicate scope: {0}")]
    Duplicate(String),

    #[error("Unknown scope: {0}")]
    Unknown(String),

    #[error("Scope name must not be empty")]
    EmptyName,
}

impl ScopeSet {
    pub fn new(flags: Vec<ScopeFlag>) -> Result<Self, ScopeSetError> {
        let mut seen = HashSet::with_capacity(flags.len());
        for flag in &flags {
            if flag.name.trim().is_empty() {
                return Err(ScopeSetError::EmptyName);
            }
            if !seen.insert(flag.name.as_str()) {
                return Err(ScopeSetError::Duplicate(flag.name.clone()));
            }
        }
        Ok(Self(flags))
    }

    /// Parse the `name enabled` pairs used by fixtures and config, e.g. `&[("auth", true)]`.
    pub fn from_pairs(pairs: &[(&str, bool)]) -> Result<Self, ScopeSetError> {
        Self::new(
            pairs
                .iter()
                .map(|(name, enabled)| ScopeFlag::new(*name, *enabled))
                .collect(),
        )
    }

    pub fn flags(&self) -> &[ScopeFlag] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ScopeFlag> {
        self.0.iter().find(|f| f.name == name)
    }

    /// `false` when the flag is absent.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.enabled)
    }

    pub fn auth_enabled(&self) -> bool {
        self.is_enabled(AUTH_SCOPE)
    }

    pub fn enabled_names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Same names, every flag disabled.
    pub fn cleared(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|f| ScopeFlag::new(f.name.clone(), false))
                .collect(),
        )
    }

    /// Apply a user's selection on top of these flags.
    ///
    /// The result keeps this set's names and order. Flags missing from the
    /// selection come out disabled; names this set does not declare are rejected.
    pub fn select(&self, selection: &ScopeSet) -> Result<Self, ScopeSetError> {
        if let Some(unknown) = selection.0.iter().find(|f| self.get(&f.name).is_none()) {
            return Err(ScopeSetError::Unknown(unknown.name.clone()));
        }
        Ok(self.select_declared(selection))
    }

    /// Like [`ScopeSet::select`], but names this set no longer declares are
    /// dropped instead of rejected.
    pub fn select_declared(&self, selection: &ScopeSet) -> Self {
        Self(
            self.0
                .iter()
                .map(|f| ScopeFlag::new(f.name.clone(), selection.is_enabled(&f.name)))
                .collect(),
        )
    }

    /// Keep flags enabled only when their name is in `approved`.
    pub fn restricted_to(&self, approved: &[String]) -> Self {
        Self(
            self.0
                .iter()
                .map(|f| {
                    ScopeFlag::new(
                        f.name.clone(),
                        f.enabled && approved.iter().any(|a| a == &f.name),
                    )
                })
                .collect(),
        )
    }
}

impl TryFrom<Vec<ScopeFlag>> for ScopeSet {
    type Error = ScopeSetError;

    fn try_from(value: Vec<ScopeFlag>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeSet> for Vec<ScopeFlag> {
    fn from(value: ScopeSet) -> Self {
        value.0
    }
}
