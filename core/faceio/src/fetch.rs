use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::decode::decode_from_bytes;
use crate::error::FaceIoError;
use crate::raster::Image;

/// Timeout applied to URL fetches when none is given.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Convert a timeout given in seconds, as bindings and config files pass it.
///
/// Zero, negative, non-finite and out-of-range values are rejected.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, FaceIoError> {
    if secs <= 0.0 {
        return Err(FaceIoError::InvalidParameter(format!(
            "timeout must be a positive number of seconds, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| {
        FaceIoError::InvalidParameter(format!("timeout of {secs} seconds is not usable: {e}"))
    })
}

/// Settings for fetching remote images.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total time allowed for connecting and reading the body.
    pub timeout: Duration,
    /// Reject bodies longer than this many bytes. `None` means unlimited.
    pub max_bytes: Option<usize>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_bytes: None,
            user_agent: concat!("faceio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchOptions {
    /// Set the request timeout (default: 8 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap the accepted body size.
    pub fn max_bytes(mut self, limit: usize) -> Self {
        self.max_bytes = Some(limit);
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

/// Reusable HTTP client for pulling images from URLs.
///
/// Holds a connection pool, so keep one around when fetching repeatedly.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: Client,
    options: FetchOptions,
}

impl UrlFetcher {
    /// Build a client from `options`.
    pub fn new(options: FetchOptions) -> Result<Self, FaceIoError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| FaceIoError::NetworkError(e.to_string()))?;
        Ok(Self { client, options })
    }

    /// Options this fetcher was built with.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// GET `url` and return the raw body. Non-2xx responses are errors.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FaceIoError> {
        tracing::debug!(url, timeout = ?self.options.timeout, "fetching image");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "image fetch rejected");
            return Err(FaceIoError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let (Some(limit), Some(length)) = (self.options.max_bytes, response.content_length()) {
            if length > limit as u64 {
                return Err(FaceIoError::NetworkError(format!(
                    "response body of {length} bytes exceeds limit of {limit}"
                )));
            }
        }

        let mut body = Vec::new();
        match self.options.max_bytes {
            Some(limit) => {
                response
                    .take(limit as u64 + 1)
                    .read_to_end(&mut body)
                    .map_err(|e| self.map_read_error(url, e))?;
                if body.len() > limit {
                    return Err(FaceIoError::NetworkError(format!(
                        "response body exceeds limit of {limit} bytes"
                    )));
                }
            }
            None => {
                let mut response = response;
                response
                    .read_to_end(&mut body)
                    .map_err(|e| self.map_read_error(url, e))?;
            }
        }

        tracing::debug!(url, status = status.as_u16(), bytes = body.len(), "fetched image");
        Ok(body)
    }

    /// GET `url` and decode the body as an image.
    pub fn fetch_image(&self, url: &str) -> Result<Image, FaceIoError> {
        let body = self.fetch_bytes(url)?;
        decode_from_bytes(&body)
    }

    fn map_transport_error(&self, url: &str, err: reqwest::Error) -> FaceIoError {
        tracing::warn!(url, error = %err, "image fetch failed");
        if err.is_timeout() {
            FaceIoError::Timeout(self.options.timeout)
        } else {
            FaceIoError::NetworkError(err.to_string())
        }
    }

    fn map_read_error(&self, url: &str, err: std::io::Error) -> FaceIoError {
        tracing::warn!(url, error = %err, "reading image body failed");
        // The blocking body reader reports its timeout as a wrapped reqwest error.
        let timed_out = err.kind() == std::io::ErrorKind::TimedOut
            || err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                .is_some_and(reqwest::Error::is_timeout);
        if timed_out {
            FaceIoError::Timeout(self.options.timeout)
        } else {
            FaceIoError::NetworkError(err.to_string())
        }
    }
}

/// Fetch and decode a remote image with a one-off client.
pub fn decode_from_url(url: &str, timeout: Duration) -> Result<Image, FaceIoError> {
    UrlFetcher::new(FetchOptions::default().timeout(timeout))?.fetch_image(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(8));
        assert!(opts.max_bytes.is_none());
        assert!(opts.user_agent.starts_with("faceio/"));
    }

    #[test]
    fn builder_overrides() {
        let opts = FetchOptions::default()
            .timeout(Duration::from_millis(250))
            .max_bytes(1024)
            .user_agent("test-agent");
        assert_eq!(opts.timeout, Duration::from_millis(250));
        assert_eq!(opts.max_bytes, Some(1024));
        assert_eq!(opts.user_agent, "test-agent");
    }

    #[test]
    fn timeout_seconds_are_converted() {
        assert_eq!(timeout_from_secs(8.0).unwrap(), DEFAULT_FETCH_TIMEOUT);
        assert_eq!(timeout_from_secs(0.25).unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn unusable_timeout_seconds_are_rejected() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30] {
            let err = timeout_from_secs(secs).unwrap_err();
            assert!(matches!(err, FaceIoError::InvalidParameter(_)), "{secs}: {err:?}");
        }
    }

    #[test]
    fn malformed_url_is_network_error() {
        let fetcher = UrlFetcher::new(FetchOptions::default()).unwrap();
        let err = fetcher.fetch_bytes("not a url").unwrap_err();
        assert!(matches!(err, FaceIoError::NetworkError(_)), "{err:?}");
    }

    #[test]
    fn plain_io_timeout_maps_to_timeout() {
        let fetcher =
            UrlFetcher::new(FetchOptions::default().timeout(Duration::from_secs(3))).unwrap();
        let err = fetcher.map_read_error(
            "http://example.invalid/",
            std::io::Error::from(std::io::ErrorKind::TimedOut),
        );
        assert!(matches!(err, FaceIoError::Timeout(t) if t == Duration::from_secs(3)));

        let err = fetcher.map_read_error(
            "http://example.invalid/",
            std::io::Error::from(std::io::ErrorKind::ConnectionReset),
        );
        assert!(matches!(err, FaceIoError::NetworkError(_)), "{err:?}");
    }

    #[test]
    fn refused_connection_is_network_error() {
        let fetcher =
            UrlFetcher::new(FetchOptions::default().timeout(Duration::from_secs(2))).unwrap();
        // Port 1 on loopback has no listener.
        let err = fetcher.fetch_bytes("http://127.0.0.1:1/face.jpg").unwrap_err();
        assert!(err.is_network(), "{err:?}");
    }
}
