pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# BUZZTAIL CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/buzztail/config.yml
#   3. /etc/buzztail/config.yml
# Without any config file the built-in defaults below are used.
#
# Environment variables override the file:
#   ALERT_THRESHOLD            consumer.alert_threshold
#   MESSAGE_INTERVAL_SECONDS   producer.interval (whole seconds)
#   BUZZTAIL_FILE              file.path
#
# Durations accept ms, s, m and h suffixes (e.g. 500ms, 3s, 1m).

# Shared append-only file. The producer creates it; the consumer requires it
# to exist and follows it from its current end.
file:
  path: logs/buzz.log

producer:
  # Delay between generated messages
  interval: 3s

consumer:
  # Alert when this many positive words have been seen since the last alert
  alert_threshold: 5
  # Message rate reporting window. Windows close when a message arrives after
  # the window has elapsed, so quiet periods delay the report.
  window: 1m
  # How long to wait before retrying when no new line is available
  poll_interval: 1s
  vocabulary:
    - amazing
    - funny
    - exciting
    - loved
    - happy
    - thrilled
    - amazed
"#
    .to_string()
}
