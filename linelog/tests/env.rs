use linelog::{logger_from_env, LogLevel, LoggerConfig, LoggingError};

// One test per binary: the environment is process-wide.
#[test]
fn env_parse_errors_are_recorded_on_the_logger() {
    std::env::set_var("LINELOG_TARGET", "Stdout");
    std::env::set_var("LINELOG_CONFIG", "default_level=warning,colour=red");
    let logger = logger_from_env(true);
    assert_eq!(logger.last_error(), LoggingError::ConfigParseError);
    assert!(logger.last_error_message().starts_with("LINELOG_CONFIG"));
    assert!(logger.last_error_message().contains("colour"));
    assert_eq!(logger.config(), LoggerConfig::default());
    drop(logger);

    std::env::set_var("LINELOG_TARGET", "Carrier:pigeon");
    std::env::set_var("LINELOG_CONFIG", "default_level=warning");
    let logger = logger_from_env(true);
    assert_eq!(logger.last_error(), LoggingError::ConfigParseError);
    assert!(logger.last_error_message().starts_with("LINELOG_TARGET"));
    assert_eq!(logger.default_level(), LogLevel::Warning);
    drop(logger);

    std::env::remove_var("LINELOG_TARGET");
    std::env::set_var("LINELOG_CONFIG", "default_level=debug");
    let logger = logger_from_env(true);
    assert_eq!(logger.last_error(), LoggingError::Success);
    assert_eq!(logger.default_level(), LogLevel::Debug);
}
