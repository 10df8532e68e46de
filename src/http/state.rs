use crate::gate::AdmissionGate;
use crate::vendor::VendorApi;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Admission gate bounding concurrent sessions
    pub gate: Arc<AdmissionGate>,
    /// Vendor boundary used by the token proxy and prompt generator
    pub vendor: Arc<dyn VendorApi>,
}

impl AppState {
    pub fn new(gate: Arc<AdmissionGate>, vendor: Arc<dyn VendorApi>) -> Self {
        Self { gate, vendor }
    }
}
