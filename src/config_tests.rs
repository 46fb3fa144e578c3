// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for environment configuration.

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::config::{parse_bool, AppConfig, ApplyStrategy};
    use crate::errors::ConfigError;
    use crate::soa::SerialStrategy;
    use crate::tsig::KeyAlgorithm;

    fn key_file_b64() -> String {
        BASE64.encode("key \"ctl\" {\n    algorithm hmac-sha256;\n    secret \"c2VjcmV0\";\n};\n")
    }

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        env.entry("BIND_TSIG_KEYFILE_B64".to_string())
            .or_insert_with(key_file_b64);
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_server, "127.0.0.1");
        assert_eq!(config.bind_port, 53);
        assert_eq!(config.bind_view, "default");
        assert_eq!(config.tsig.name, "ctl");
        assert_eq!(config.tsig.algorithm, KeyAlgorithm::HmacSha256);
        assert_eq!(config.zone_output_dir, PathBuf::from("zones"));
        assert_eq!(config.named_checkzone_bin.as_deref(), Some("named-checkzone"));
        assert_eq!(config.rndc_bin.as_deref(), Some("rndc"));
        assert_eq!(config.rndc_server, "127.0.0.1");
        assert_eq!(config.serial_strategy, SerialStrategy::Date);
        assert_eq!(config.default_record_ttl, 3600);
        assert!(!config.git_auto_commit);
        assert_eq!(config.git_commit_template, "feat(zone): update {zone}");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.dns_timeout, Duration::from_secs(10));
        assert_eq!(config.apply_strategy, ApplyStrategy::Dynamic);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BIND_SERVER", "10.0.0.5"),
            ("BIND_PORT", "5353"),
            ("RNDC_SERVER", "10.0.0.6"),
            ("APPLY_STRATEGY", "ZONE"),
            ("SERIAL_STRATEGY", "epoch"),
            ("AXFR_TIMEOUT", "2.5"),
            ("GIT_AUTO_COMMIT", "yes"),
            ("NAMED_CHECKZONE_BIN", ""),
            ("BIND_TSIG_NAME", "override"),
        ])
        .unwrap();

        assert_eq!(config.server_address(), "10.0.0.5:5353");
        assert_eq!(config.rndc_server, "10.0.0.6");
        assert_eq!(config.apply_strategy, ApplyStrategy::Zone);
        assert_eq!(config.serial_strategy, SerialStrategy::Epoch);
        assert_eq!(config.dns_timeout, Duration::from_millis(2500));
        assert!(config.git_auto_commit);
        assert_eq!(config.named_checkzone_bin, None);
        assert_eq!(config.tsig.name, "override");
    }

    #[test]
    fn test_rndc_server_defaults_to_bind_server() {
        let config = load(&[("BIND_SERVER", "ns1.internal")]).unwrap();
        assert_eq!(config.rndc_server, "ns1.internal");
    }

    #[test]
    fn test_ipv6_server_address() {
        let config = load(&[("BIND_SERVER", "2001:db8::53")]).unwrap();
        assert_eq!(config.server_address(), "[2001:db8::53]:53");
    }

    #[test]
    fn test_missing_key_file() {
        let result = AppConfig::from_lookup(|_| None);
        assert!(
            matches!(result, Err(ConfigError::Missing { key }) if key == "BIND_TSIG_KEYFILE_B64")
        );
    }

    #[test]
    fn test_invalid_apply_strategy() {
        let result = load(&[("APPLY_STRATEGY", "carrier-pigeon")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key, .. }) if key == "APPLY_STRATEGY"));
    }

    #[test]
    fn test_invalid_serial_strategy() {
        let result = load(&[("SERIAL_STRATEGY", "increment")]);
        assert!(
            matches!(result, Err(ConfigError::Invalid { key, .. }) if key == "SERIAL_STRATEGY")
        );
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[("BIND_PORT", "99999")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key, .. }) if key == "BIND_PORT"));
    }

    #[test]
    fn test_invalid_timeout() {
        for value in ["0", "-1", "soon"] {
            let result = load(&[("AXFR_TIMEOUT", value)]);
            assert!(
                matches!(
                    result,
                    Err(ConfigError::Invalid { ref key, .. }) if key == "AXFR_TIMEOUT"
                ),
                "value {value}"
            );
        }
    }

    #[test]
    fn test_commit_message() {
        let config = load(&[("GIT_COMMIT_TEMPLATE", "chore: sync {zone} zone")]).unwrap();
        assert_eq!(config.commit_message("example.com."), "chore: sync example.com zone");
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["1", "true", "TRUE", "yes", "y", "on", " on "] {
            assert!(parse_bool(Some(truthy), false), "{truthy}");
        }
        for falsy in ["0", "false", "no", "off", ""] {
            assert!(!parse_bool(Some(falsy), true), "{falsy}");
        }
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }
}
