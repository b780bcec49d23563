//! Shared HTTP client construction for the model and store backends.

use std::time::Duration;

use docent_core::error::DocentError;
use reqwest::Client;

/// Build a `reqwest` client. A `timeout_secs` of 0 means no timeout.
pub fn build_client(timeout_secs: u64, accept_invalid_certs: bool) -> Result<Client, DocentError> {
    let mut builder = Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder
        .build()
        .map_err(|e| DocentError::Config(format!("Failed to build HTTP client: {}", e)))
}
