use crate::{
    HttpErrorEvent, PendingOperation, ResourceErrorEvent, TrustDecisionRequest, WebViewClient,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};





mod verification_roots;

/// Counts how often each terminal action of a handle ran.
#[derive(Debug, Default)]
struct ActionCounts {
    resumed: AtomicUsize,
    rejected: AtomicUsize,
}

impl ActionCounts {
    fn resumed(&self) -> usize {
        self.resumed.load(Ordering::SeqCst)
    }

    fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    fn total(&self) -> usize {
        self.resumed() + self.rejected()
    }
}

/// A pending operation which only records what happened to it.
struct CountingHandle(Arc<ActionCounts>);

impl CountingHandle {
    fn new() -> (Box<Self>, Arc<ActionCounts>) {
        let counts = Arc::new(ActionCounts::default());
        (Box::new(Self(Arc::clone(&counts))), counts)
    }
}

impl PendingOperation for CountingHandle {
    fn resume(self: Box<Self>) {
        self.0.resumed.fetch_add(1, Ordering::SeqCst);
    }

    fn reject(self: Box<Self>) {
        self.0.rejected.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stands in for the host's default client, remembering every delegated callback.
#[derive(Debug, Default)]
struct RecordingClient {
    certificate_errors: Mutex<Vec<TrustDecisionRequest>>,
    resource_errors: Mutex<Vec<ResourceErrorEvent>>,
    http_errors: Mutex<Vec<HttpErrorEvent>>,
}

impl WebViewClient for RecordingClient {
    fn on_certificate_error(
        &self,
        request: &TrustDecisionRequest,
        handle: Box<dyn PendingOperation>,
    ) {
        self.certificate_errors.lock().unwrap().push(request.clone());
        handle.reject();
    }

    fn on_resource_error(&self, event: &ResourceErrorEvent) {
        self.resource_errors.lock().unwrap().push(event.clone());
    }

    fn on_http_error(&self, event: &HttpErrorEvent) {
        self.http_errors.lock().unwrap().push(event.clone());
    }
}

const APPLICATION_HOST: &str = "cliente.solucnet.com";
const PARENT_DOMAIN: &str = "solucnet.com";
