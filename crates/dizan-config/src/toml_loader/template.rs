//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Dizan Configuration
# Only override what you want to change -- missing fields use defaults.
# The API key is never read from this file: set GOOGLE_API_KEY in the
# environment or in a .env file next to where dizan is started.

[server]
# host = "127.0.0.1"
# port = 8501
# session_idle_secs = 3600   # >= 60; idle sessions are ended
# reap_interval_secs = 60

[completion]
# model = "gemini-2.0-flash"
# temperature = 0.7          # 0.0-2.0
# max_output_tokens = 2048   # 1-8192
# timeout_secs = 60          # 1-600
# max_retries = 1            # 0-5, transient failures only
# max_context_exchanges = 50 # 1-1000, earlier exchanges replayed to the model
# streaming = true
# verify_credential = true

[persona]
# preamble = "You are a professional therapist. ..."

[logging]
# level = "info"             # trace, debug, info, warn, error
"##
    .to_string()
}
