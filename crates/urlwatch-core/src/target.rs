//! Validation of monitor registration input.

use thiserror::Error;
use url::Url;

use crate::{MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("check_interval must be between {MIN_INTERVAL_MINUTES} and {MAX_INTERVAL_MINUTES} minutes, got {0}")]
    Interval(u32),
    #[error("url is empty")]
    EmptyUrl,
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Check that an interval (minutes) lies within the accepted bounds, inclusive.
pub fn validate_interval(minutes: u32) -> Result<u32, ValidationError> {
    if (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::Interval(minutes))
    }
}

/// Parse a monitor target. Only absolute `http`/`https` URLs with a host
/// are accepted. Returns the normalized form.
pub fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_bounds_are_inclusive() {
        assert_eq!(validate_interval(5), Ok(5));
        assert_eq!(validate_interval(60), Ok(60));
        assert_eq!(validate_interval(30), Ok(30));
    }

    #[test]
    fn interval_outside_bounds_rejected() {
        assert_eq!(validate_interval(3), Err(ValidationError::Interval(3)));
        assert_eq!(validate_interval(4), Err(ValidationError::Interval(4)));
        assert_eq!(validate_interval(61), Err(ValidationError::Interval(61)));
        assert_eq!(validate_interval(0), Err(ValidationError::Interval(0)));
    }

    #[test]
    fn http_and_https_accepted() {
        assert_eq!(
            validate_url("https://example.com").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            validate_url("http://127.0.0.1:8080/health").unwrap(),
            "http://127.0.0.1:8080/health"
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            validate_url("  https://example.com/a  ").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn empty_url_rejected() {
        assert_eq!(validate_url(""), Err(ValidationError::EmptyUrl));
        assert_eq!(validate_url("   "), Err(ValidationError::EmptyUrl));
    }

    #[test]
    fn relative_url_rejected() {
        assert!(matches!(
            validate_url("example.com/path"),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn other_schemes_rejected() {
        assert_eq!(
            validate_url("ftp://example.com/file"),
            Err(ValidationError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(ValidationError::UnsupportedScheme(_))
        ));
    }
}
