use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("form endpoint is not configured")]
    Missing,
    #[error("form endpoint '{endpoint}' is not a valid url: {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("form endpoint '{endpoint}' does not match {expected}")]
    Mismatch { endpoint: String, expected: String },
}

/// Which endpoints the controller is willing to post to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    scheme: String,
    host: String,
    path_prefix: String,
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::formspree()
    }
}

impl EndpointPolicy {
    pub fn formspree() -> Self {
        Self::new("https", "formspree.io", "/f/")
    }

    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path_prefix: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path_prefix: path_prefix.into(),
        }
    }

    pub fn check(&self, raw: &str) -> Result<Url, EndpointError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EndpointError::Missing);
        }

        let url = Url::parse(raw).map_err(|err| EndpointError::Malformed {
            endpoint: raw.to_string(),
            reason: err.to_string(),
        })?;

        let matches = url.scheme() == self.scheme
            && url.host_str() == Some(self.host.as_str())
            && url.username().is_empty()
            && url.password().is_none()
            && url.path().starts_with(&self.path_prefix)
            && url.path().len() > self.path_prefix.len();
        if !matches {
            return Err(EndpointError::Mismatch {
                endpoint: raw.to_string(),
                expected: self.describe(),
            });
        }

        Ok(url)
    }

    fn describe(&self) -> String {
        format!("{}://{}{}<form-id>", self.scheme, self.host, self.path_prefix)
    }
}
