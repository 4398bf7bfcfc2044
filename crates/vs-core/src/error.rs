use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    /// Bad or missing input. Never sent upstream.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{message}")]
    Upstream {
        message: String,
        code: Option<String>,
    },

    #[error("{0}")]
    Timeout(String),
}

impl GenError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            code: None,
        }
    }

    pub fn missing_credential() -> Self {
        Self::Auth("Please set your API key in settings first".into())
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
