// ABOUTME: Integration tests for configuration parsing and layering.
// ABOUTME: Tests YAML parsing, file discovery, and CLI > env > file > default precedence.

use sagedeploy::config::*;
use std::fs;
use std::time::Duration;

const ROLE: &str = "arn:aws:iam::123456789012:role/SageMakerExecution";

mod parsing {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert!(config.region.is_none());
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.monitor.timeout, Duration::from_secs(1800));
        assert_eq!(config.monitor.poll_interval, Duration::from_secs(30));
        assert_eq!(config.rollback.verify_attempts, 3);
        assert_eq!(config.rollback.settle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn parse_full_config() {
        let yaml = format!(
            r#"
region: ca-central-1
profile: ml-deploy
execution_role_arn: {ROLE}
instance_type: ml.m5.xlarge
endpoint_prefix: fraud
monitor:
  timeout: 45m
  poll_interval: 15s
  log_poll_interval: 2s
  log_poll_max_interval: 20s
  log_lookback: 5m
  log_retention_days: 7
rollback:
  verify_attempts: 5
  verify_interval: 20s
  settle_timeout: 15m
"#
        );
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.region.as_deref(), Some("ca-central-1"));
        assert_eq!(config.profile.as_deref(), Some("ml-deploy"));
        assert_eq!(config.execution_role_arn.unwrap().to_string(), ROLE);
        assert_eq!(config.instance_type.unwrap().as_str(), "ml.m5.xlarge");
        assert_eq!(config.monitor.timeout, Duration::from_secs(45 * 60));
        assert_eq!(config.monitor.poll_interval, Duration::from_secs(15));
        assert_eq!(config.monitor.log_retention_days, Some(7));
        assert_eq!(config.rollback.verify_attempts, 5);
        assert_eq!(config.rollback.verify_interval, Duration::from_secs(20));
        assert_eq!(config.rollback.settle_timeout, Duration::from_secs(15 * 60));
    }

    #[test]
    fn retention_can_be_disabled() {
        let config = Config::from_yaml("monitor:\n  log_retention_days: null\n").unwrap();
        assert_eq!(config.monitor.log_retention_days, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_yaml("regoin: us-east-1\n").unwrap_err();
        assert!(err.to_string().contains("regoin"), "{err}");
    }

    #[test]
    fn malformed_role_arn_is_rejected() {
        let err = Config::from_yaml("execution_role_arn: not-a-role\n").unwrap_err();
        assert!(err.to_string().contains("not-a-role"), "{err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_yaml("monitor:\n  timeout: 0s\n").unwrap_err();
        assert!(err.to_string().contains("monitor.timeout"), "{err}");
    }

    #[test]
    fn zero_verify_attempts_is_rejected() {
        let err = Config::from_yaml("rollback:\n  verify_attempts: 0\n").unwrap_err();
        assert!(err.to_string().contains("verify_attempts"), "{err}");
    }
}

mod discovery {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert!(config.region.is_none());
    }

    #[test]
    fn finds_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "region: eu-west-1\n").unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn finds_file_in_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".sagedeploy")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), "region: us-west-2\n").unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn primary_file_wins_over_alternates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "region: eu-west-1\n").unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_ALT), "region: us-east-1\n").unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    }
}

mod layering {
    use super::*;

    fn file() -> Config {
        Config::from_yaml(&format!(
            "region: eu-west-1\nexecution_role_arn: {ROLE}\nendpoint_prefix: fraud\n"
        ))
        .unwrap()
    }

    #[test]
    fn file_values_apply_without_env_or_flags() {
        let settings = Settings::resolve(file(), &Overrides::default(), |_| None).unwrap();
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.execution_role_arn.as_deref(), Some(ROLE));
        assert_eq!(settings.endpoint_prefix, "fraud");
        assert_eq!(settings.instance_type.as_str(), "ml.c5.2xlarge");
    }

    #[test]
    fn env_beats_file_and_flags_beat_env() {
        temp_env::with_vars(
            [
                (ENV_REGION, Some("us-east-1")),
                (
                    ENV_EXECUTION_ROLE,
                    Some("arn:aws:iam::999999999999:role/Other"),
                ),
            ],
            || {
                let settings = Settings::from_env(file(), &Overrides::default()).unwrap();
                assert_eq!(settings.region.as_deref(), Some("us-east-1"));
                assert_eq!(
                    settings.execution_role_arn.as_deref(),
                    Some("arn:aws:iam::999999999999:role/Other")
                );

                let overrides = Overrides {
                    region: Some("ap-southeast-2".to_string()),
                    ..Default::default()
                };
                let settings = Settings::from_env(file(), &overrides).unwrap();
                assert_eq!(settings.region.as_deref(), Some("ap-southeast-2"));
            },
        );
    }

    #[test]
    fn blank_env_values_are_ignored() {
        temp_env::with_var(ENV_REGION, Some("  "), || {
            let settings = Settings::from_env(file(), &Overrides::default()).unwrap();
            assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        });
    }

    #[test]
    fn timing_flags_override_monitor_settings() {
        let overrides = Overrides {
            timeout: Some(Duration::from_secs(60)),
            poll_interval: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let settings = Settings::resolve(file(), &overrides, |_| None).unwrap();
        assert_eq!(settings.monitor.timeout, Duration::from_secs(60));
        assert_eq!(settings.monitor.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let overrides = Overrides {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(Settings::resolve(file(), &overrides, |_| None).is_err());
    }

    #[test]
    fn defaults_without_anything() {
        let settings =
            Settings::resolve(Config::default(), &Overrides::default(), |_| None).unwrap();
        assert!(settings.region.is_none());
        assert!(settings.execution_role_arn.is_none());
        assert_eq!(settings.endpoint_prefix, DEFAULT_ENDPOINT_PREFIX);
    }
}
