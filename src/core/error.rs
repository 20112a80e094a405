use thiserror::Error;

#[derive(Error, Debug)]
pub enum TacticsError {
    /// Unknown unit or weapon id in master data
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl TacticsError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }

    /// Is this a rejected player/AI action (as opposed to a setup failure)?
    pub fn is_invalid_action(&self) -> bool {
        matches!(self, Self::InvalidAction(_))
    }
}

pub type Result<T> = std::result::Result<T, TacticsError>;
