#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
//! Scoped certificate-error overrides for an embedded web view.
//!
//! The web view host reports three kinds of failures: a server certificate that
//! didn't validate, a resource that failed to load, and an HTTP error response. A
//! [`CertificateTrustInterceptor`] logs all three and, for certificate failures on
//! hosts in its allow-list, tells the host to continue anyway. Every other outcome
//! is left to the host's default behavior.
//!
//! The same decision can be used for connections made from Rust through
//! [`TrustOverrideVerifier`], which only consults the interceptor after a real
//! verifier has rejected a certificate.
//!
//! The allow-list is fixed when the library is built. See the `build.rs` script for
//! the available knobs.

use rustls::{client::WantsClientCert, ClientConfig, ConfigBuilder, WantsVerifier};
use std::sync::Arc;

mod client;
pub use client::{CertificateTrustInterceptor, PlatformDefault, WebViewClient, LOG_TAG};

mod events;
pub use events::{
    CapturedDecision, DecisionCapture, HttpErrorEvent, PendingOperation, ResourceErrorEvent,
    SslErrorKind, TrustDecision, TrustDecisionRequest,
};

mod policy;
pub use policy::{HostMatch, PolicyError, TrustPolicy, TrustPolicyBuilder};

mod verification;
pub use verification::{TrustOverrideVerifier, Verifier};

/// Entry points for the Android web view shell.
#[cfg(target_os = "android")]
#[cfg_attr(docsrs, doc(cfg(target_os = "android")))]
pub mod android;

#[cfg(test)]
mod tests;

/// Extension trait to help configure [`ClientConfig`]s with a trust interceptor.
pub trait BuilderTrustExt {
    /// Configures the `ClientConfig` to verify certificates against the platform's roots,
    /// letting `client` override failures.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use rustls::ClientConfig;
    /// use webview_trust_interceptor::{BuilderTrustExt, CertificateTrustInterceptor};
    ///
    /// let provider = Arc::new(rustls::crypto::ring::default_provider());
    /// let config = ClientConfig::builder_with_provider(provider)
    ///     .with_safe_default_protocol_versions()
    ///     .unwrap()
    ///     .with_trust_interceptor(Arc::new(CertificateTrustInterceptor::compiled()))
    ///     .with_no_client_auth();
    /// ```
    fn with_trust_interceptor(
        self,
        client: Arc<dyn WebViewClient>,
    ) -> ConfigBuilder<ClientConfig, WantsClientCert>;
}

impl BuilderTrustExt for ConfigBuilder<ClientConfig, WantsVerifier> {
    fn with_trust_interceptor(
        self,
        client: Arc<dyn WebViewClient>,
    ) -> ConfigBuilder<ClientConfig, WantsClientCert> {
        let provider = self.crypto_provider().clone();
        let verifier = TrustOverrideVerifier::new(Verifier::new().with_provider(provider), client);
        self.dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
    }
}

/// Extension trait to help build a [`ClientConfig`] with the compiled allow-list.
pub trait ConfigTrustExt {
    /// Build a [`ClientConfig`] using *ring*, the platform's roots, and the allow-list
    /// compiled into this library.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by [`ConfigBuilder::with_safe_default_protocol_versions`].
    fn with_compiled_trust_policy() -> Result<ClientConfig, rustls::Error>;
}

impl ConfigTrustExt for ClientConfig {
    fn with_compiled_trust_policy() -> Result<ClientConfig, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        Ok(ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_trust_interceptor(Arc::new(CertificateTrustInterceptor::compiled()))
            .with_no_client_auth())
    }
}
