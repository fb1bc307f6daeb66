pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# STREAMHUB INGEST CONFIGURATION
# =============================================================================
# Every setting is optional; omitted values fall back to the defaults shown.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/streamhub/config.yml
#   3. /etc/streamhub/config.yml
#
# Values may reference environment variables with $env{VAR_NAME}.

# =============================================================================
# SERVER
# =============================================================================
server:
  # Address the HTTP listener binds to
  listen: "0.0.0.0:8080"
  # Requests with a larger body are rejected with 413
  max_body_bytes: 2097152

# =============================================================================
# STORAGE
# =============================================================================
# Events are appended, one JSON object per line, to <data_dir>/<file_name>.
# The directory is created at startup if it does not exist.
storage:
  data_dir: data
  file_name: events.log
"#
    .to_string()
}
