use super::Verifier;
use crate::client::{CertificateTrustInterceptor, WebViewClient};
use crate::events::{DecisionCapture, SslErrorKind, TrustDecision, TrustDecisionRequest};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types;
use rustls::{DigitallySignedStruct, Error as TlsError, SignatureScheme};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// A verifier that asks a [`WebViewClient`] what to do when the wrapped verifier
/// rejects a certificate.
///
/// Only certificate failures are ever handed to the client. Everything else the
/// wrapped verifier reports, such as a missing root store, is returned as-is, and
/// handshake signatures are always checked by the wrapped verifier.
pub struct TrustOverrideVerifier<V = Verifier> {
    inner: V,
    client: Arc<dyn WebViewClient>,
}

impl TrustOverrideVerifier<Verifier> {
    /// Wraps the platform-root [`Verifier`] with an interceptor for the compiled allow-list.
    pub fn compiled() -> Self {
        Self::new(
            Verifier::new(),
            Arc::new(CertificateTrustInterceptor::compiled()),
        )
    }
}

impl<V: ServerCertVerifier> TrustOverrideVerifier<V> {
    /// Wraps `inner`, consulting `client` whenever it rejects a certificate.
    pub fn new(inner: V, client: Arc<dyn WebViewClient>) -> Self {
        Self { inner, client }
    }

    fn decide(&self, server_name: &pki_types::ServerName<'_>, err: &TlsError) -> TrustDecision {
        let url = match server_url(server_name) {
            Some(url) => url,
            None => return TrustDecision::Reject,
        };

        let request = TrustDecisionRequest::new(Some(url.as_str()), SslErrorKind::from(err));
        let (handle, captured) = DecisionCapture::channel();
        self.client.on_certificate_error(&request, Box::new(handle));

        // A client that drops the handle without acting leaves the default in place.
        captured.decision().unwrap_or(TrustDecision::Reject)
    }
}

impl<V: fmt::Debug> fmt::Debug for TrustOverrideVerifier<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustOverrideVerifier")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<V: ServerCertVerifier> ServerCertVerifier for TrustOverrideVerifier<V> {
    fn verify_server_cert(
        &self,
        end_entity: &pki_types::CertificateDer<'_>,
        intermediates: &[pki_types::CertificateDer<'_>],
        server_name: &pki_types::ServerName<'_>,
        ocsp_response: &[u8],
        now: pki_types::UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(err @ TlsError::InvalidCertificate(_)) => match self.decide(server_name, &err) {
                TrustDecision::Resume => {
                    log::warn!("overriding certificate failure for {:?}: {}", server_name, err);
                    Ok(ServerCertVerified::assertion())
                }
                TrustDecision::Reject => Err(err),
            },
            result => result,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// The URL a web view would have reported for a connection to `server_name`.
pub(crate) fn server_url(server_name: &pki_types::ServerName<'_>) -> Option<String> {
    match server_name {
        pki_types::ServerName::DnsName(name) => Some(format!("https://{}/", name.as_ref())),
        pki_types::ServerName::IpAddress(ip) => match IpAddr::from(*ip) {
            IpAddr::V4(ip) => Some(format!("https://{ip}/")),
            IpAddr::V6(ip) => Some(format!("https://[{ip}]/")),
        },
        _ => None,
    }
}
