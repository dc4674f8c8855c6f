//! Exit codes for the CLI

use andpubutil_play::PlayError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error, including bad usage
pub const ERROR: i32 = 1;

/// Configuration error (credentials, unsupported files)
pub const CONFIG_ERROR: i32 = 2;

/// Publishing failed after every attempt
pub const PUBLISH_ERROR: i32 = 3;

/// Map a top-level error to an exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PlayError>() {
        Some(e) if e.is_configuration() => CONFIG_ERROR,
        Some(_) => PUBLISH_ERROR,
        None => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_error() {
        let err = anyhow::Error::new(PlayError::NoArtifacts);
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err = anyhow::Error::new(PlayError::ApiError {
            status: 500,
            message: "boom".into(),
        })
        .context("Publishing failed");
        assert_eq!(for_error(&err), PUBLISH_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("other")), ERROR);
    }
}
