use std::path::PathBuf;

use thiserror::Error;

use crate::automation::AutomationError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Publisher file not found: {0}")]
    MissingInput(PathBuf),

    #[error("file must have a .pub extension: {0}")]
    WrongExtension(PathBuf),

    #[error("input directory not found: {0}")]
    MissingInputRoot(PathBuf),

    #[error("output validation failed: {0}")]
    Validation(String),

    #[error("automation error: {0}")]
    Automation(#[from] AutomationError),

    #[error("failed to convert after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConvertError {
    /// COM HRESULT carried by this error, if it came from the automation side.
    /// Drives the supervisor's retryable/terminal classification.
    pub fn com_code(&self) -> Option<i32> {
        match self {
            ConvertError::Automation(err) => err.com_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn com_code_surfaces_through_wrapper() {
        let err = ConvertError::Automation(AutomationError::Com {
            code: -2147221457,
            message: "dialog open".into(),
        });
        assert_eq!(err.com_code(), Some(-2147221457));
    }

    #[test]
    fn non_automation_errors_have_no_com_code() {
        assert_eq!(
            ConvertError::Validation("missing resource dir".into()).com_code(),
            None
        );
        assert_eq!(
            ConvertError::MissingInput(PathBuf::from("a.pub")).com_code(),
            None
        );
    }

    #[test]
    fn retries_exhausted_embeds_last_cause() {
        let err = ConvertError::RetriesExhausted {
            attempts: 3,
            source: Box::new(ConvertError::Automation(AutomationError::Com {
                code: -2147221457,
                message: "dialog open".into(),
            })),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("-2147221457"));
    }
}
