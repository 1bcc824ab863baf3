//! Tests of the root-store verifier against real certificates, alone and wrapped by
//! the trust override.
//!
//! The certificates here are generated by `gen.sh` with a fixed validity window so
//! they can be checked at a known time. `root.crt` is a CA trusted through
//! [`Verifier::new_with_extra_roots`], `root-ee_example.com.crt` is a leaf it signed,
//! and `self-signed_cliente.solucnet.com.crt` is the kind of certificate the
//! application host serves.

use super::APPLICATION_HOST;
use crate::{
    CertificateTrustInterceptor, HostMatch, SslErrorKind, TrustOverrideVerifier, TrustPolicy,
    Verifier,
};
use rustls::client::danger::ServerCertVerifier;
use rustls::pki_types;
use std::sync::Arc;
use std::time::Duration;

const ROOT: &[u8] = include_bytes!("root.crt");
const ROOT_EE_EXAMPLE_COM: &[u8] = include_bytes!("root-ee_example.com.crt");
const SELF_SIGNED_APPLICATION_HOST: &[u8] =
    include_bytes!("self-signed_cliente.solucnet.com.crt");

// Saturday, April 27, 2024 18:28:07 UTC
const VALID_TIME: u64 = 1_714_242_489;
// Monday, November 20, 2080 18:13:20 UTC, after the fixtures' validity ends.
const EXPIRED_TIME: u64 = 3_500_000_000;

struct TestCase<'a> {
    /// The name of the server we're connecting to.
    pub reference_id: &'a str,

    /// The certificate the server presents.
    pub end_entity: &'a [u8],

    /// Whether the root-store verifier is wrapped in the trust override.
    pub overridden: bool,

    /// Seconds since the Unix epoch at which the chain is checked.
    pub verification_time: u64,

    pub expected_result: Result<(), SslErrorKind>,
}

macro_rules! root_store_test_cases {
    { $( $name:ident => $test_case:expr ),+ , } => {
        $(
            #[test]
            fn $name() {
                test_with_root_store(&$test_case);
            }
        )+
    };
}

fn root_store() -> Verifier {
    Verifier::new_with_extra_roots([pki_types::CertificateDer::from(ROOT)])
        .with_provider(Arc::new(rustls::crypto::ring::default_provider()))
}

fn test_with_root_store(test_case: &TestCase) {
    log::info!("verifying {:?}", test_case.reference_id);

    let verifier: Box<dyn ServerCertVerifier> = if test_case.overridden {
        let policy = TrustPolicy::new([APPLICATION_HOST], HostMatch::Exact).unwrap();
        Box::new(TrustOverrideVerifier::new(
            root_store(),
            Arc::new(CertificateTrustInterceptor::new(policy)),
        ))
    } else {
        Box::new(root_store())
    };

    let server_name = pki_types::ServerName::try_from(test_case.reference_id).unwrap();
    let result = verifier
        .verify_server_cert(
            &pki_types::CertificateDer::from(test_case.end_entity),
            &[],
            &server_name,
            &[],
            pki_types::UnixTime::since_unix_epoch(Duration::from_secs(
                test_case.verification_time,
            )),
        )
        .map(|_| ())
        .map_err(|err| SslErrorKind::from(&err));

    assert_eq!(result, test_case.expected_result);
}

root_store_test_cases! {
    extra_root_signed_leaf_verifies => TestCase {
        reference_id: "example.com",
        end_entity: ROOT_EE_EXAMPLE_COM,
        overridden: false,
        verification_time: VALID_TIME,
        expected_result: Ok(()),
    },
    extra_root_signed_leaf_verifies_with_override => TestCase {
        reference_id: "example.com",
        end_entity: ROOT_EE_EXAMPLE_COM,
        overridden: true,
        verification_time: VALID_TIME,
        expected_result: Ok(()),
    },
    extra_root_signed_leaf_wrong_name => TestCase {
        reference_id: "example.org",
        end_entity: ROOT_EE_EXAMPLE_COM,
        overridden: false,
        verification_time: VALID_TIME,
        expected_result: Err(SslErrorKind::IdMismatch),
    },
    wrong_name_kept_for_other_hosts_with_override => TestCase {
        reference_id: "example.org",
        end_entity: ROOT_EE_EXAMPLE_COM,
        overridden: true,
        verification_time: VALID_TIME,
        expected_result: Err(SslErrorKind::IdMismatch),
    },
    extra_root_signed_leaf_expired => TestCase {
        reference_id: "example.com",
        end_entity: ROOT_EE_EXAMPLE_COM,
        overridden: false,
        verification_time: EXPIRED_TIME,
        expected_result: Err(SslErrorKind::Expired),
    },
    self_signed_application_host_untrusted => TestCase {
        reference_id: APPLICATION_HOST,
        end_entity: SELF_SIGNED_APPLICATION_HOST,
        overridden: false,
        verification_time: VALID_TIME,
        expected_result: Err(SslErrorKind::Untrusted),
    },
    self_signed_application_host_overridden => TestCase {
        reference_id: APPLICATION_HOST,
        end_entity: SELF_SIGNED_APPLICATION_HOST,
        overridden: true,
        verification_time: VALID_TIME,
        expected_result: Ok(()),
    },
    self_signed_leaf_kept_for_other_hosts_with_override => TestCase {
        reference_id: "example.com",
        end_entity: SELF_SIGNED_APPLICATION_HOST,
        overridden: true,
        verification_time: VALID_TIME,
        expected_result: Err(SslErrorKind::Untrusted),
    },
}

#[test]
fn bare_root_store_reports_unknown_issuer_for_self_signed_leaf() {
    let server_name = pki_types::ServerName::try_from(APPLICATION_HOST).unwrap();
    let result = root_store().verify_server_cert(
        &pki_types::CertificateDer::from(SELF_SIGNED_APPLICATION_HOST),
        &[],
        &server_name,
        &[],
        pki_types::UnixTime::since_unix_epoch(Duration::from_secs(VALID_TIME)),
    );

    assert!(matches!(
        result,
        Err(rustls::Error::InvalidCertificate(
            rustls::CertificateError::UnknownIssuer
        ))
    ));
}
