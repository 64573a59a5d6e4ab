//! Server configuration validation (bind address, session lifetime).

use crate::schema::DizanConfig;

use super::helpers::{validate_not_blank, validate_range};

/// Validate all server-related constraints.
pub(crate) fn validate_server(errors: &mut Vec<String>, config: &DizanConfig) {
    let server = &config.server;
    validate_not_blank(errors, "server.host", &server.host);
    if server.port == 0 {
        errors.push("server.port must be non-zero".into());
    }
    validate_range(
        errors,
        "server.session_idle_secs",
        server.session_idle_secs,
        60,
        7 * 24 * 3600,
    );
    validate_range(
        errors,
        "server.reap_interval_secs",
        server.reap_interval_secs,
        1,
        3600,
    );
}
