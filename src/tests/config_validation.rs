#[cfg(test)]
mod tests {

    use std::io::Write;
    use std::path::Path;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use crate::config::proc_loader::file_to_config;
    use crate::config::proc_loader::parse_config;
    use crate::config::proc_validator::validate_service_config;
    use crate::data::catalog::Catalog;
    use crate::tests::common::config_yaml;
    use crate::ServiceConfig;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[tokio::test]
    #[serial]
    async fn validate_bundled_config_is_valid() {
        let path = Path::new("price-loadgen.yaml");
        let service_config: ServiceConfig = file_to_config(path)
            .await
            .expect("price-loadgen.yaml must exist in repo root for tests");
        validate_service_config(&service_config).await.unwrap();

        assert_eq!(service_config.target.path, "/financial/price");
        assert_eq!(service_config.probes.sku_block.block_size, 30);

        let catalog = Catalog::from_config(&service_config.data, service_config.probes.sku_block.block_size)
            .expect("bundled data files must load");
        assert_eq!(catalog.skus().len(), 90);
        assert_eq!(catalog.blocks().len(), 3);
        assert!(!catalog.buyer_codes().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn env_toggles_disable_probe_variants() {
        let file = write_config(
            r#"
auth:
  token_url: "${TOKEN_URL_UNDER_TEST:http://127.0.0.1:8080/token}"
  client_id: "id"
  client_secret:
    from_env: "CLIENT_SECRET_UNDER_TEST"
target:
  host: "http://127.0.0.1:8081"
probes:
  full_skus:
    enabled: "${RUN_GET_PRICE_UNDER_TEST:1}"
  sku_block:
    enabled: "${RUN_SKU_BLOCK_UNDER_TEST:1}"
data:
  skus: ["000000000000031933"]
  buyer_codes: ["0007554445"]
"#,
        );

        std::env::set_var("RUN_SKU_BLOCK_UNDER_TEST", "0");
        let config = file_to_config(file.path()).await;
        std::env::remove_var("RUN_SKU_BLOCK_UNDER_TEST");
        let config = config.unwrap();

        assert!(config.probes.full_skus.enabled);
        assert!(!config.probes.sku_block.enabled);
        assert_eq!(config.auth.token_url, "http://127.0.0.1:8080/token");
        assert_eq!(config.auth.refresh_interval_seconds, 250);
        assert_eq!(config.probes.alert_threshold_seconds, 10.0);
        assert_eq!(config.load.users, 10);
        assert_eq!(config.load.run_time_seconds, None);
    }

    #[tokio::test]
    async fn normalizes_target_host_and_path() {
        let config = parse_config(config_yaml("http://127.0.0.1:1/token", "http://127.0.0.1:2"))
            .await
            .unwrap();
        assert_eq!(config.target.host, "http://127.0.0.1:2");
        assert_eq!(config.target.path, "/financial/price");
        assert!(config.settings.logging.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "config is not valid")]
    async fn zero_users_is_rejected() {
        let yaml = config_yaml("http://127.0.0.1:1/token", "http://127.0.0.1:2")
            .replace("users: 2", "users: 0");
        parse_config(yaml).await.unwrap();
    }

    #[tokio::test]
    async fn every_problem_is_reported_at_once() {
        let yaml = config_yaml("ftp://127.0.0.1:1/token", "http://127.0.0.1:2")
            .replace("refresh_interval_seconds: 250", "refresh_interval_seconds: 0")
            .replace("block_size: 2", "block_size: 0");
        let err = parse_config(yaml).await.unwrap_err().to_string();

        assert!(err.contains("auth.token_url"), "{}", err);
        assert!(err.contains("refresh_interval_seconds"), "{}", err);
        assert!(err.contains("block_size"), "{}", err);
    }

    #[tokio::test]
    async fn missing_auth_section_fails_to_parse() {
        let err = parse_config(
            r#"
target:
  host: "http://127.0.0.1:8081"
data:
  skus: ["a"]
  buyer_codes: ["b"]
"#
            .to_owned(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("auth"), "{}", err);
    }
}
