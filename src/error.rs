use std::path::PathBuf;

/// The message reported when the input image cannot be read or decoded.
pub const LOAD_ERROR_MESSAGE: &str = "Erro: Não foi possível carregar a imagem.";

/// Errors that can occur while running the analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The input image could not be opened or decoded.
    ///
    /// Displays as [`LOAD_ERROR_MESSAGE`]; the cause is available through
    /// [`std::error::Error::source`].
    #[error("Erro: Não foi possível carregar a imagem.")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An output image could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::AnalyzerConfig`].
    #[error("failed to parse configuration {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn image_load_displays_literal_message() {
        let err = AnalysisError::ImageLoad {
            path: PathBuf::from("missing.png"),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )),
        };
        assert_eq!(err.to_string(), LOAD_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "Erro: Não foi possível carregar a imagem.");
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_config_names_the_problem() {
        let err = AnalysisError::InvalidConfig("min_area must be below max_area".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: min_area must be below max_area"
        );
    }
}
