pub type KaruselResult<T> = Result<T, KaruselError>;

#[derive(thiserror::Error, Debug)]
pub enum KaruselError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KaruselError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            KaruselError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(KaruselError::layout("x").to_string().contains("layout error:"));
        assert!(KaruselError::render("x").to_string().contains("render error:"));
        assert!(
            KaruselError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = KaruselError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
