use std::time::Duration;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};

use crate::LroError;

/// Header carrying the API key on every call.
pub static API_KEY_HEADER: &str = "x-goog-api-key";
/// Header identifying the calling application.
pub static CLIENT_ID_HEADER: &str = "x-client-identifier";

/// Per-call settings handed through to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub metadata: Vec<(String, String)>,
}

impl CallOptions {
    pub fn new() -> Self {
        CallOptions::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.metadata.push((name.to_string(), value.to_string()));
        self
    }

    /// Layer `overrides` over these options. Timeouts and headers set per
    /// call win over the defaults.
    pub fn merge(&self, overrides: Option<CallOptions>) -> CallOptions {
        let Some(overrides) = overrides else {
            return self.clone();
        };
        let mut metadata = self.metadata.clone();
        metadata.extend(overrides.metadata);
        CallOptions {
            timeout: overrides.timeout.or(self.timeout),
            metadata,
        }
    }

    /// Check every header is representable as ASCII gRPC metadata.
    pub fn validate(&self) -> Result<(), LroError> {
        self.parsed_metadata().map(|_| ())
    }

    fn parsed_metadata(&self) -> Result<Vec<(AsciiMetadataKey, AsciiMetadataValue)>, LroError> {
        self.metadata
            .iter()
            .map(|(name, value)| {
                let key = AsciiMetadataKey::from_bytes(name.as_bytes())
                    .map_err(|_| LroError::InvalidOption(format!("header name {name:?}")))?;
                let value = value
                    .parse::<AsciiMetadataValue>()
                    .map_err(|_| LroError::InvalidOption(format!("value of header {name:?}")))?;
                Ok((key, value))
            })
            .collect()
    }

    pub(crate) fn apply<M>(&self, request: &mut tonic::Request<M>) -> Result<(), LroError> {
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        for (key, value) in self.parsed_metadata()? {
            request.metadata_mut().insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_call_options_win() {
        let defaults = CallOptions::new()
            .with_timeout(Duration::from_secs(10))
            .with_header(API_KEY_HEADER, "default-key");
        let merged = defaults.merge(Some(
            CallOptions::new()
                .with_timeout(Duration::from_secs(1))
                .with_header(API_KEY_HEADER, "call-key"),
        ));
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));

        let mut request = tonic::Request::new(());
        merged.apply(&mut request).unwrap();
        assert_eq!(request.metadata().get(API_KEY_HEADER).unwrap(), "call-key");
        assert!(request.metadata().get("grpc-timeout").is_some());
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let defaults = CallOptions::new().with_header(CLIENT_ID_HEADER, "lroctl");
        assert_eq!(defaults.merge(None), defaults);
        let merged = defaults.merge(Some(CallOptions::new()));
        assert_eq!(merged, defaults);
    }

    #[test]
    fn rejects_unrepresentable_headers() {
        let bad_name = CallOptions::new().with_header("bad header", "x");
        assert!(matches!(bad_name.validate(), Err(LroError::InvalidOption(_))));
        let bad_value = CallOptions::new().with_header("x-ok", "line\nbreak");
        assert!(matches!(bad_value.validate(), Err(LroError::InvalidOption(_))));
    }
}
