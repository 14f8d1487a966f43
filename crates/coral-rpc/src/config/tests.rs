//! Unit tests for dispatcher configuration.

use std::str::FromStr;

use rstest::rstest;

use super::*;

#[test]
fn defaults_are_info_json_strict_with_backtraces() {
    let config = DispatchConfig::default();
    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.registration_policy(), RegistrationPolicy::Strict);
    assert!(config.capture_backtraces());
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let config: DispatchConfig =
        serde_json::from_str(r#"{"registration_policy":"lenient"}"#).expect("parse config");
    assert_eq!(config.registration_policy(), RegistrationPolicy::Lenient);
    assert_eq!(config.log_filter(), "info");
    assert!(config.capture_backtraces());
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("COMPACT", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(LogFormat::from_str(text).expect("parse format"), expected);
}

#[rstest]
#[case("strict", RegistrationPolicy::Strict)]
#[case("Lenient", RegistrationPolicy::Lenient)]
fn policy_parses_case_insensitively(#[case] text: &str, #[case] expected: RegistrationPolicy) {
    assert_eq!(RegistrationPolicy::from_str(text).expect("parse policy"), expected);
}

#[test]
fn unknown_policy_is_rejected() {
    assert!(RegistrationPolicy::from_str("permissive").is_err());
}

#[test]
fn builders_replace_fields() {
    let config = DispatchConfig::default()
        .with_log_filter("coral_rpc=debug")
        .with_log_format(LogFormat::Compact)
        .with_registration_policy(RegistrationPolicy::Lenient)
        .with_capture_backtraces(false);
    assert_eq!(config.log_filter(), "coral_rpc=debug");
    assert_eq!(config.log_format().to_string(), "compact");
    assert_eq!(config.registration_policy().to_string(), "lenient");
    assert!(!config.capture_backtraces());
}
