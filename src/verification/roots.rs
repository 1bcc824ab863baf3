use super::log_server_cert;
use once_cell::sync::OnceCell;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types;
use rustls::{
    crypto::CryptoProvider, DigitallySignedStruct, Error as TlsError, OtherError, SignatureScheme,
};
use std::sync::Arc;

/// A TLS certificate verifier that uses the system's root store and WebPKI.
///
/// This does the actual certificate validation. Wrap it in a
/// [`TrustOverrideVerifier`](super::TrustOverrideVerifier) to let the interceptor
/// override its failures.
#[derive(Debug)]
pub struct Verifier {
    // We use a `OnceCell` so we only need
    // to try loading native root certs once per verifier.
    inner: OnceCell<Arc<WebPkiServerVerifier>>,

    // Extra roots to trust above and beyond those provided by the platform.
    extra_roots: Vec<pki_types::CertificateDer<'static>>,

    crypto_provider: OnceCell<Arc<CryptoProvider>>,
}

impl Verifier {
    /// Creates a new verifier whose certificate validation is provided by
    /// WebPKI, using root certificates provided by the platform.
    ///
    /// Without [`with_provider`][Verifier::with_provider], the process-default
    /// [`CryptoProvider`] is used, or *ring* if none has been installed.
    pub fn new() -> Self {
        Self {
            inner: OnceCell::new(),
            extra_roots: Vec::new(),
            crypto_provider: OnceCell::new(),
        }
    }

    /// Creates a new verifier whose certificate validation is provided by
    /// WebPKI, using root certificates provided by the platform and augmented by
    /// the provided extra root certificates.
    pub fn new_with_extra_roots(
        roots: impl IntoIterator<Item = pki_types::CertificateDer<'static>>,
    ) -> Self {
        Self {
            inner: OnceCell::new(),
            extra_roots: roots.into_iter().collect(),
            crypto_provider: OnceCell::new(),
        }
    }

    /// Chainable setter to configure the [`CryptoProvider`] for this `Verifier`.
    pub fn with_provider(self, crypto_provider: Arc<CryptoProvider>) -> Self {
        // A fresh cell can't have been initialized yet.
        let _ = self.crypto_provider.set(crypto_provider);
        self
    }

    fn get_provider(&self) -> &Arc<CryptoProvider> {
        self.crypto_provider.get_or_init(|| {
            CryptoProvider::get_default()
                .cloned()
                .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
        })
    }

    fn get_or_init_verifier(&self) -> Result<&Arc<WebPkiServerVerifier>, TlsError> {
        self.inner.get_or_try_init(|| self.init_verifier())
    }

    // Attempt to load CA root certificates present on system, fallback to WebPKI roots if none
    fn init_verifier(&self) -> Result<Arc<WebPkiServerVerifier>, TlsError> {
        let mut root_store = rustls::RootCertStore::empty();

        if !self.extra_roots.is_empty() {
            let (added, ignored) =
                root_store.add_parsable_certificates(self.extra_roots.iter().cloned());
            if ignored != 0 {
                log::warn!("{ignored} extra CA certificates were ignored due to errors");
            }
            log::debug!("Loaded {added} extra CA certificates in addition to possible system roots");
        }

        #[cfg(not(any(target_os = "android", target_arch = "wasm32")))]
        {
            let result = rustls_native_certs::load_native_certs();
            let (added, ignored) = root_store.add_parsable_certificates(result.certs);
            if ignored != 0 {
                log::warn!("Some CA root certificates were ignored due to errors");
            }

            for error in result.errors {
                log::warn!("Error loading CA root certificate: {error}");
            }

            log::debug!("Loaded {added} CA certificates from the system");
        }

        if root_store.is_empty() {
            log::warn!("No CA certificates were loaded from the system, using bundled roots");
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        WebPkiServerVerifier::builder_with_provider(
            root_store.into(),
            Arc::clone(self.get_provider()),
        )
        .build()
        .map_err(|e| TlsError::Other(OtherError(Arc::new(e))))
    }
}

impl ServerCertVerifier for Verifier {
    fn verify_server_cert(
        &self,
        end_entity: &pki_types::CertificateDer<'_>,
        intermediates: &[pki_types::CertificateDer<'_>],
        server_name: &pki_types::ServerName<'_>,
        ocsp_response: &[u8],
        now: pki_types::UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        log_server_cert(end_entity);

        self.get_or_init_verifier()?
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            // This only contains information from the system or other public
            // bits of the TLS handshake, so it can't leak anything.
            .map_err(|e| {
                log::error!("failed to verify TLS certificate: {}", e);
                e
            })
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.get_or_init_verifier()?
            .verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.get_or_init_verifier()?
            .verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        // The wrapped `WebPkiServerVerifier` uses the same provider, so the schemes
        // are identical without forcing the root store to load.
        self.get_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
