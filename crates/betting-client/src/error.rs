//! Error types for the client and the scenario runner.

use thiserror::Error;

/// Errors raised by the HTTP gateway and the domain client.
///
/// Malformed-but-parseable responses are not errors; they degrade to
/// unresolved fields and the scenario layer decides pass/fail.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Building the underlying HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Base URL or request path could not be joined into a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection, timeout or other transport-level failure.
    #[error("transport error on {method} {path}: {source}")]
    Transport {
        /// HTTP method.
        method: reqwest::Method,
        /// Request path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Token generation was rejected or returned no token.
    #[error("authentication failed: HTTP {status}")]
    AuthFailed {
        /// Status returned by the token endpoint.
        status: u16,
    },

    /// An endpoint whose failure is fatal returned a non-success status.
    #[error("{endpoint} failed: HTTP {status}")]
    EndpointFailed {
        /// Logical endpoint name.
        endpoint: &'static str,
        /// Status returned.
        status: u16,
    },

    /// No odds could be resolved for a leg that must carry one.
    #[error("no odds available for fixture {fixture_id} market {market}")]
    OddsUnavailable {
        /// Fixture the lookup started from.
        fixture_id: String,
        /// Requested market name.
        market: String,
    },
}

/// Scenario outcome errors. Any of these fails the scenario.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Client-level failure that aborts the scenario.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Loading a scenario config file failed.
    #[error("config error: {0}")]
    Config(String),

    /// A fixture, quote or response field could not be resolved.
    #[error("unresolved {what}: {detail}")]
    Unresolved {
        /// What was being resolved.
        what: &'static str,
        /// Diagnostic context.
        detail: String,
    },

    /// A checked invariant did not hold.
    #[error("assertion `{check}` failed: expected {expected}, got {actual}")]
    Assertion {
        /// Name of the invariant.
        check: &'static str,
        /// Expected value (rendered).
        expected: String,
        /// Observed value (rendered).
        actual: String,
    },

    /// Decimal arithmetic exceeded the representable range.
    #[error("decimal overflow while computing {0}")]
    Overflow(&'static str),

    /// The scenario did not finish within the overall timeout.
    #[error("scenario timed out after {0}s")]
    Timeout(u64),
}

impl ScenarioError {
    pub(crate) fn unresolved(what: &'static str, detail: impl Into<String>) -> Self {
        ScenarioError::Unresolved { what, detail: detail.into() }
    }

    pub(crate) fn assertion(
        check: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ScenarioError::Assertion {
            check,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
