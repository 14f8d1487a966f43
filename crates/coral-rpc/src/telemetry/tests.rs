//! Unit tests for filter selection and telemetry errors.

use rstest::rstest;

use super::*;

fn config() -> DispatchConfig {
    DispatchConfig::default().with_log_filter("coral_rpc=warn")
}

#[rstest]
#[case::unset(None)]
#[case::empty(Some(""))]
#[case::blank(Some("   "))]
fn blank_environment_falls_back_to_config(#[case] env_value: Option<&str>) {
    let filter = LogFilter::resolve(&config(), env_value);
    assert_eq!(filter.directives(), "coral_rpc=warn");
    assert_eq!(filter.origin(), FilterOrigin::Config);
}

#[test]
fn environment_directives_win_over_config() {
    let filter = LogFilter::resolve(&config(), Some(" coral_rpc::dispatch=trace "));
    assert_eq!(filter.directives(), "coral_rpc::dispatch=trace");
    assert_eq!(filter.origin(), FilterOrigin::Environment);
}

#[rstest]
#[case::config(None, FilterOrigin::Config, "from dispatch config")]
#[case::environment(Some("coral_rpc=loudest"), FilterOrigin::Environment, "from RUST_LOG")]
fn invalid_directives_name_their_origin(
    #[case] env_value: Option<&str>,
    #[case] origin: FilterOrigin,
    #[case] rendered: &str,
) {
    let config = DispatchConfig::default().with_log_filter("coral_rpc=loudest");
    let filter = LogFilter::resolve(&config, env_value);
    let error = filter.env_filter().expect_err("filter should not parse");
    assert!(
        matches!(error, TelemetryError::Filter { origin: found, .. } if found == origin),
        "unexpected error: {error:?}"
    );
    let message = error.to_string();
    assert!(message.contains("\"coral_rpc=loudest\""), "{message}");
    assert!(message.contains(rendered), "{message}");
}

#[test]
fn valid_directives_build_a_filter() {
    let filter = LogFilter::resolve(&config(), None);
    assert!(filter.env_filter().is_ok());
}
