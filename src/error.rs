//! The DNS/`getaddrinfo` error taxonomy (spec §7) and the single error type
//! every public resolver operation fails with.

use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = std::result::Result<T, DnsError>;

/// The stable "code" every resolver error carries, mirroring the codes a
/// platform DNS resolver raises (`NOTFOUND`, `TIMEOUT`, ...) plus the
/// Node-style `ERR_*` codes used for argument validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Formerr,
    Servfail,
    /// NXDOMAIN
    NotFound,
    Notimp,
    Refused,
    NoData,
    BadResp,
    BadName,
    BadFamily,
    BadFlags,
    BadHints,
    Timeout,
    ConnRefused,
    Cancelled,
    Einval,
    InvalidArgType,
    InvalidArgValue,
    MissingArgs,
    SocketBadPort,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Formerr => "FORMERR",
            ErrorCode::Servfail => "SERVFAIL",
            ErrorCode::NotFound => "NOTFOUND",
            ErrorCode::Notimp => "NOTIMP",
            ErrorCode::Refused => "REFUSED",
            ErrorCode::NoData => "NODATA",
            ErrorCode::BadResp => "BADRESP",
            ErrorCode::BadName => "BADNAME",
            ErrorCode::BadFamily => "BADFAMILY",
            ErrorCode::BadFlags => "BADFLAGS",
            ErrorCode::BadHints => "BADHINTS",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ConnRefused => "CONNREFUSED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Einval => "EINVAL",
            ErrorCode::InvalidArgType => "ERR_INVALID_ARG_TYPE",
            ErrorCode::InvalidArgValue => "ERR_INVALID_ARG_VALUE",
            ErrorCode::MissingArgs => "ERR_MISSING_ARGS",
            ErrorCode::SocketBadPort => "ERR_SOCKET_BAD_PORT",
        }
    }

    /// Attempt classification within a single attempt loop (spec §4.2):
    /// HTTP statuses and transport error codes that warrant another try.
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(
            status,
            408 | 413 | 429 | 500 | 502 | 503 | 504 | 521 | 522 | 524
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolver error: `{message, code, syscall, hostname, errno?, errors?}`
/// (spec §6, "Error surface").
#[derive(Debug, Clone)]
pub struct DnsError {
    pub message: String,
    pub code: ErrorCode,
    pub syscall: Option<String>,
    pub hostname: Option<String>,
    pub errno: Option<String>,
    /// Non-empty only for the combined error produced when every server in
    /// a query failed (spec §4.2 step 3, §7 "Propagation").
    pub errors: Vec<DnsError>,
}

impl DnsError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            syscall: None,
            hostname: None,
            errno: None,
            errors: Vec::new(),
        }
    }

    pub fn with_syscall(mut self, syscall: impl Into<String>) -> Self {
        self.syscall = Some(syscall.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_errno(mut self, errno: impl Into<String>) -> Self {
        self.errno = Some(errno.into());
        self
    }

    /// Combine per-server errors accumulated by the Query Engine into one
    /// error: messages deduplicated and joined with `"; "`, `code`/`errno`
    /// preserved only if identical across every member (spec §7).
    pub fn combine(mut errors: Vec<DnsError>) -> DnsError {
        if errors.len() == 1 {
            return errors.remove(0);
        }

        let mut seen = rustc_hash::FxHashSet::default();
        let mut messages = Vec::new();
        for e in &errors {
            if seen.insert(e.message.clone()) {
                messages.push(e.message.clone());
            }
        }

        let shared_code = errors
            .first()
            .map(|e| e.code)
            .filter(|code| errors.iter().all(|e| e.code == *code))
            .unwrap_or(ErrorCode::BadResp);

        let shared_errno = errors.first().and_then(|e| e.errno.clone()).filter(|errno| {
            errors
                .iter()
                .all(|e| e.errno.as_deref() == Some(errno.as_str()))
        });

        DnsError {
            message: messages.join("; "),
            code: shared_code,
            syscall: None,
            hostname: None,
            errno: shared_errno,
            errors,
        }
    }
}

impl fmt::Display for DnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.code)?;
        if let Some(syscall) = &self.syscall {
            write!(f, "{} ", syscall)?;
        }
        if let Some(hostname) = &self.hostname {
            write!(f, "{} ", hostname)?;
        }
        write!(f, "({})", self.message)
    }
}

impl StdError for DnsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}

impl From<crate::dns::ParseError> for DnsError {
    fn from(err: crate::dns::ParseError) -> Self {
        DnsError::new(ErrorCode::BadResp, err.to_string())
    }
}

/// Classify a transport-level failure per spec §7's "Transport/system
/// errors are folded into this set" table.
pub fn classify_transport_error(err: &reqwest::Error) -> ErrorCode {
    if err.is_timeout() {
        return ErrorCode::Timeout;
    }
    if err.is_connect() {
        return ErrorCode::ConnRefused;
    }
    if err.is_request() || err.is_body() || err.is_decode() {
        return ErrorCode::BadResp;
    }
    ErrorCode::BadResp
}

impl From<reqwest::Error> for DnsError {
    fn from(err: reqwest::Error) -> Self {
        let code = classify_transport_error(&err);
        DnsError::new(code, err.to_string())
    }
}

/// Builds a transport error honoring `returnHTTPErrors` (spec §6/§7): by
/// default several distinct failure modes conflate to `TIMEOUT`/
/// `CONNREFUSED` for parity with a platform resolver; with the option set,
/// the code classification is unchanged (attempt retry logic still needs
/// it) but the message carries the underlying error's full detail instead
/// of just its top-level `Display` text.
pub fn transport_error(err: reqwest::Error, return_http_errors: bool) -> DnsError {
    let code = classify_transport_error(&err);
    let message = if return_http_errors {
        format!("{err:?}")
    } else {
        err.to_string()
    };
    DnsError::new(code, message)
}

/// Configuration/argument validation errors (spec §6 "Configuration
/// record" validation), surfaced with Node-style `ERR_*` codes.
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidArgType(String),
    InvalidArgValue(String),
    MissingArgs(String),
    SocketBadPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidArgType(msg) => write!(f, "invalid argument type: {msg}"),
            ConfigError::InvalidArgValue(msg) => write!(f, "invalid argument value: {msg}"),
            ConfigError::MissingArgs(msg) => write!(f, "missing argument: {msg}"),
            ConfigError::SocketBadPort(msg) => write!(f, "invalid port: {msg}"),
        }
    }
}

impl StdError for ConfigError {}

impl From<ConfigError> for DnsError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::InvalidArgType(_) => ErrorCode::InvalidArgType,
            ConfigError::InvalidArgValue(_) => ErrorCode::InvalidArgValue,
            ConfigError::MissingArgs(_) => ErrorCode::MissingArgs,
            ConfigError::SocketBadPort(_) => ErrorCode::SocketBadPort,
        };
        DnsError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_preserves_shared_code() {
        let errs = vec![
            DnsError::new(ErrorCode::Timeout, "a"),
            DnsError::new(ErrorCode::Timeout, "b"),
        ];
        let combined = DnsError::combine(errs);
        assert_eq!(combined.code, ErrorCode::Timeout);
        assert_eq!(combined.message, "a; b");
    }

    #[test]
    fn combine_falls_back_to_badresp_on_mixed_codes() {
        let errs = vec![
            DnsError::new(ErrorCode::Timeout, "a"),
            DnsError::new(ErrorCode::ConnRefused, "b"),
        ];
        let combined = DnsError::combine(errs);
        assert_eq!(combined.code, ErrorCode::BadResp);
    }

    #[test]
    fn combine_dedupes_identical_messages() {
        let errs = vec![
            DnsError::new(ErrorCode::Timeout, "same"),
            DnsError::new(ErrorCode::Timeout, "same"),
        ];
        let combined = DnsError::combine(errs);
        assert_eq!(combined.message, "same");
    }
}
