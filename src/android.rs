//! JNI exports for the Java `com.solucnet.tecnicos.SSLWebViewClient`.
//!
//! The Java class keeps extending the bridge's web view client and forwards each
//! callback here. For certificate failures it calls `handler.proceed()` when
//! `nativeShouldProceed` returns `true`, and the base class otherwise:
//!
//! ```java
//! private static native boolean nativeShouldProceed(String url, int primaryError);
//! private static native void nativeOnReceivedError(String url, String description, int errorCode);
//! private static native void nativeOnReceivedHttpError(String url, int statusCode);
//! ```

use crate::client::{CertificateTrustInterceptor, WebViewClient, LOG_TAG};
use crate::events::{
    DecisionCapture, HttpErrorEvent, ResourceErrorEvent, SslErrorKind, TrustDecision,
    TrustDecisionRequest,
};
use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jint, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use once_cell::sync::OnceCell;

static INTERCEPTOR: OnceCell<CertificateTrustInterceptor> = OnceCell::new();

fn interceptor() -> &'static CertificateTrustInterceptor {
    INTERCEPTOR.get_or_init(|| {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag(LOG_TAG),
        );
        CertificateTrustInterceptor::compiled()
    })
}

// A `null` or unreadable Java string is treated as absent.
fn read_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        return None;
    }

    match env.get_string(value) {
        Ok(value) => Some(value.into()),
        Err(e) => {
            log::error!(target: LOG_TAG, "failed to read Java string: {}", e);
            None
        }
    }
}

/// Returns `JNI_TRUE` if the certificate failure for `url` should be ignored.
#[no_mangle]
pub extern "system" fn Java_com_solucnet_tecnicos_SSLWebViewClient_nativeShouldProceed(
    mut env: JNIEnv,
    _class: JClass,
    url: JString,
    primary_error: jint,
) -> jboolean {
    let interceptor = interceptor();
    let url = read_string(&mut env, &url);

    let request = TrustDecisionRequest::new(url.as_deref(), SslErrorKind::from_code(primary_error));
    let (handle, captured) = DecisionCapture::channel();
    interceptor.on_certificate_error(&request, Box::new(handle));

    match captured.decision() {
        Some(TrustDecision::Resume) => JNI_TRUE,
        _ => JNI_FALSE,
    }
}

/// Logs a resource load failure.
#[no_mangle]
pub extern "system" fn Java_com_solucnet_tecnicos_SSLWebViewClient_nativeOnReceivedError(
    mut env: JNIEnv,
    _class: JClass,
    url: JString,
    description: JString,
    error_code: jint,
) {
    let interceptor = interceptor();
    let event = ResourceErrorEvent {
        request_url: read_string(&mut env, &url).unwrap_or_default(),
        description: read_string(&mut env, &description).unwrap_or_default(),
        error_code,
    };
    interceptor.on_resource_error(&event);
}

/// Logs an HTTP error response.
#[no_mangle]
pub extern "system" fn Java_com_solucnet_tecnicos_SSLWebViewClient_nativeOnReceivedHttpError(
    mut env: JNIEnv,
    _class: JClass,
    url: JString,
    status_code: jint,
) {
    let interceptor = interceptor();
    let event = HttpErrorEvent {
        request_url: read_string(&mut env, &url).unwrap_or_default(),
        status_code: u16::try_from(status_code).unwrap_or_default(),
    };
    interceptor.on_http_error(&event);
}
