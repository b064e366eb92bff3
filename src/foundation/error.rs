pub type IsavizResult<T> = Result<T, IsavizError>;

#[derive(thiserror::Error, Debug)]
pub enum IsavizError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IsavizError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for IsavizError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            IsavizError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(IsavizError::config("x").to_string().contains("config error:"));
        assert!(
            IsavizError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = IsavizError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_become_serde() {
        let e = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(IsavizError::from(e), IsavizError::Serde(_)));
    }
}
