/// Convenience result type used across watchres.
pub type ResResult<T> = Result<T, ResError>;

/// Top-level error taxonomy used by codec APIs.
#[derive(thiserror::Error, Debug)]
pub enum ResError {
    /// Unrecognized magic, violated header invariants, truncated input, or an
    /// encode-side model the container cannot represent.
    #[error("structural error: {0}")]
    Structural(String),

    /// LZ4 payload did not decompress to the declared size.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Pixel payload could not be converted to or from an RGBA raster.
    #[error("pixel format error: {0}")]
    Pixel(String),

    /// Errors when serializing or deserializing the unpacked representation.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResError {
    /// Build a [`ResError::Structural`] value.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Build a [`ResError::Decompression`] value.
    pub fn decompression(msg: impl Into<String>) -> Self {
        Self::Decompression(msg.into())
    }

    /// Build a [`ResError::Pixel`] value.
    pub fn pixel(msg: impl Into<String>) -> Self {
        Self::Pixel(msg.into())
    }

    /// Build a [`ResError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Prefix the message with where the error happened, keeping the variant.
    pub fn context(self, at: impl std::fmt::Display) -> Self {
        match self {
            Self::Structural(msg) => Self::Structural(format!("{at}: {msg}")),
            Self::Decompression(msg) => Self::Decompression(format!("{at}: {msg}")),
            Self::Pixel(msg) => Self::Pixel(format!("{at}: {msg}")),
            Self::Serde(msg) => Self::Serde(format!("{at}: {msg}")),
            Self::Other(err) => Self::Other(err.context(at.to_string())),
        }
    }

    /// True for errors that abort decoding of a whole container.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
