use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator profile cached next to the session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub nombre: Option<String>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            nombre: None,
        }
    }

    pub fn with_name(mut self, nombre: impl Into<String>) -> Self {
        self.nombre = Some(nombre.into());
        self
    }

    pub fn display_name(&self) -> &str {
        match self.nombre.as_deref() {
            Some(nombre) if !nombre.is_empty() => nombre,
            _ => &self.username,
        }
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
