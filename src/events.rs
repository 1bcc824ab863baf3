//! Transient values handed to the interceptor for the duration of a single callback.

use rustls::{CertificateError, Error as TlsError};
use std::sync::mpsc;

/// Why the platform failed to validate a server certificate.
///
/// The numeric codes match the primary error constants of Android's `SslError`, so
/// values coming over JNI can be converted with [`SslErrorKind::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslErrorKind {
    /// The certificate is not yet valid.
    NotYetValid,
    /// The certificate has expired.
    Expired,
    /// The certificate was not issued for the requested host.
    IdMismatch,
    /// The certificate authority is not trusted.
    Untrusted,
    /// The certificate date is invalid.
    DateInvalid,
    /// A generic error occurred.
    Invalid,
    /// A code this library doesn't know about.
    Other(i32),
}

impl SslErrorKind {
    /// Converts a platform primary error code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::NotYetValid,
            1 => Self::Expired,
            2 => Self::IdMismatch,
            3 => Self::Untrusted,
            4 => Self::DateInvalid,
            5 => Self::Invalid,
            other => Self::Other(other),
        }
    }

    /// Returns the platform primary error code.
    pub fn code(self) -> i32 {
        match self {
            Self::NotYetValid => 0,
            Self::Expired => 1,
            Self::IdMismatch => 2,
            Self::Untrusted => 3,
            Self::DateInvalid => 4,
            Self::Invalid => 5,
            Self::Other(code) => code,
        }
    }
}

impl From<&TlsError> for SslErrorKind {
    fn from(err: &TlsError) -> Self {
        match err {
            TlsError::InvalidCertificate(cert_err) => match cert_err {
                CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
                    Self::Expired
                }
                CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
                    Self::NotYetValid
                }
                CertificateError::NotValidForName
                | CertificateError::NotValidForNameContext { .. } => Self::IdMismatch,
                CertificateError::UnknownIssuer => Self::Untrusted,
                _ => Self::Invalid,
            },
            _ => Self::Invalid,
        }
    }
}

/// A certificate validation failure that needs a trust decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDecisionRequest {
    /// The URL of the resource whose certificate failed validation, if the host knows it.
    pub url: Option<String>,
    /// The reason validation failed.
    pub error: SslErrorKind,
}

impl TrustDecisionRequest {
    /// Creates a request for `url` failing with `error`.
    pub fn new(url: Option<&str>, error: SslErrorKind) -> Self {
        Self {
            url: url.map(str::to_owned),
            error,
        }
    }

    /// The URL as a string slice, treating an empty URL the same as a missing one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// A generic resource load failure. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceErrorEvent {
    /// The URL of the resource that failed.
    pub request_url: String,
    /// The host's description of the failure.
    pub description: String,
    /// The host's error code.
    pub error_code: i32,
}

/// An HTTP error response for a resource. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpErrorEvent {
    /// The URL of the resource that failed.
    pub request_url: String,
    /// The HTTP status of the response.
    pub status_code: u16,
}

/// The outcome of a trust decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Treat the certificate as trusted and continue the network operation.
    Resume,
    /// Abort the operation as untrusted.
    Reject,
}

/// The suspended network operation waiting on a trust decision.
///
/// Both actions consume the handle, so at most one of them can ever run.
pub trait PendingOperation: Send {
    /// Continue the operation as if the certificate were valid.
    fn resume(self: Box<Self>);

    /// Abort the operation. This is the platform's default behavior.
    fn reject(self: Box<Self>);
}

/// A [`PendingOperation`] that records which action was taken, for callers that need
/// the decision synchronously.
#[derive(Debug)]
pub struct DecisionCapture {
    tx: mpsc::SyncSender<TrustDecision>,
}

/// The receiving side of a [`DecisionCapture`].
#[derive(Debug)]
pub struct CapturedDecision {
    rx: mpsc::Receiver<TrustDecision>,
}

impl DecisionCapture {
    /// Creates a handle and the slot its decision will be delivered to.
    pub fn channel() -> (Self, CapturedDecision) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { tx }, CapturedDecision { rx })
    }

    fn deliver(self, decision: TrustDecision) {
        // The receiver may already be gone if the caller stopped waiting.
        let _ = self.tx.try_send(decision);
    }
}

impl PendingOperation for DecisionCapture {
    fn resume(self: Box<Self>) {
        self.deliver(TrustDecision::Resume);
    }

    fn reject(self: Box<Self>) {
        self.deliver(TrustDecision::Reject);
    }
}

impl CapturedDecision {
    /// Returns the recorded decision, or `None` if the handle was dropped without one.
    pub fn decision(&self) -> Option<TrustDecision> {
        self.rx.try_recv().ok()
    }
}
