//! The web view callbacks and the interceptor that implements them.

use crate::events::{
    HttpErrorEvent, PendingOperation, ResourceErrorEvent, TrustDecision, TrustDecisionRequest,
};
use crate::policy::TrustPolicy;

/// Tag attached to every diagnostic line emitted by the interceptor.
pub const LOG_TAG: &str = "SSLWebViewClient";

/// The error callbacks a web view host invokes while loading a page.
///
/// Hosts may call these concurrently from their own threads.
pub trait WebViewClient: Send + Sync {
    /// A server certificate failed validation. Exactly one of `handle`'s actions must run.
    fn on_certificate_error(
        &self,
        request: &TrustDecisionRequest,
        handle: Box<dyn PendingOperation>,
    );

    /// A resource failed to load.
    fn on_resource_error(&self, event: &ResourceErrorEvent);

    /// A resource load returned an HTTP error status.
    fn on_http_error(&self, event: &HttpErrorEvent);
}

/// The host's own behavior: reject every certificate failure and do nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformDefault;

impl WebViewClient for PlatformDefault {
    fn on_certificate_error(
        &self,
        _request: &TrustDecisionRequest,
        handle: Box<dyn PendingOperation>,
    ) {
        handle.reject();
    }

    fn on_resource_error(&self, _event: &ResourceErrorEvent) {}

    fn on_http_error(&self, _event: &HttpErrorEvent) {}
}

/// Overrides certificate failures for allow-listed hosts and logs load errors.
///
/// Anything it doesn't override is passed on to the `fallback` client unchanged.
#[derive(Debug, Clone)]
pub struct CertificateTrustInterceptor<D = PlatformDefault> {
    policy: TrustPolicy,
    fallback: D,
}

impl CertificateTrustInterceptor<PlatformDefault> {
    /// Creates an interceptor for `policy` that falls back to the platform default.
    pub fn new(policy: TrustPolicy) -> Self {
        Self::with_fallback(policy, PlatformDefault)
    }

    /// Creates an interceptor for the hosts compiled into this build.
    pub fn compiled() -> Self {
        Self::new(TrustPolicy::compiled().clone())
    }
}

impl<D: WebViewClient> CertificateTrustInterceptor<D> {
    /// Creates an interceptor that delegates everything it doesn't override to `fallback`.
    pub fn with_fallback(policy: TrustPolicy, fallback: D) -> Self {
        Self { policy, fallback }
    }

    /// The policy deciding which failures are overridden.
    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// The client handling everything that isn't overridden.
    pub fn fallback(&self) -> &D {
        &self.fallback
    }
}

impl<D: WebViewClient> WebViewClient for CertificateTrustInterceptor<D> {
    fn on_certificate_error(
        &self,
        request: &TrustDecisionRequest,
        handle: Box<dyn PendingOperation>,
    ) {
        let url = request.url();
        log::debug!(target: LOG_TAG, "SSL error for URL: {}", url.unwrap_or("<none>"));
        log::debug!(target: LOG_TAG, "error type: {}", request.error.code());

        match self.policy.decide(url) {
            TrustDecision::Resume => {
                log::debug!(target: LOG_TAG, "accepting certificate for: {}", url.unwrap_or("<none>"));
                handle.resume();
            }
            TrustDecision::Reject => {
                log::debug!(target: LOG_TAG, "rejecting certificate for: {}", url.unwrap_or("<none>"));
                self.fallback.on_certificate_error(request, handle);
            }
        }
    }

    fn on_resource_error(&self, event: &ResourceErrorEvent) {
        log::error!(target: LOG_TAG, "resource error: {}", event.description);
        log::error!(target: LOG_TAG, "URL: {}", event.request_url);
        log::error!(target: LOG_TAG, "error code: {}", event.error_code);
        self.fallback.on_resource_error(event);
    }

    fn on_http_error(&self, event: &HttpErrorEvent) {
        log::error!(target: LOG_TAG, "HTTP error: {}", event.status_code);
        log::error!(target: LOG_TAG, "URL: {}", event.request_url);
        self.fallback.on_http_error(event);
    }
}
