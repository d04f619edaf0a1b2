use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::optimizer::PackingConfig;
use crate::sizes::{SizeSourceConfig, parse_pack_sizes};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub sizes: SizeSourceConfig,
    pub solver: SolverConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            sizes: size_source_from_env(),
            solver: SolverConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
    request_timeout: Duration,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    const HOST_VAR: &'static str = "PACKWISE_API_HOST";
    const PORT_VAR: &'static str = "PACKWISE_API_PORT";
    const TIMEOUT_VAR: &'static str = "PACKWISE_API_REQUEST_TIMEOUT_SECS";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let bind_ip = match host_value.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            }
        };

        let port = load_with_warning(
            Self::PORT_VAR,
            Self::DEFAULT_PORT,
            |value| value != 0,
            "must not be 0",
        );

        let timeout_secs = load_with_warning(
            Self::TIMEOUT_VAR,
            Self::DEFAULT_TIMEOUT_SECS,
            |value| value > 0,
            "must be greater than 0",
        );

        Self::new(bind_ip, port, Duration::from_secs(timeout_secs))
    }

    /// Builds a config directly, bypassing the environment.
    pub fn new(bind_ip: IpAddr, port: u16, request_timeout: Duration) -> Self {
        Self {
            bind_ip,
            display_host: bind_ip.to_string(),
            port,
            request_timeout,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Upper bound for handling a single request.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

const PROVIDER_VAR: &str = "PACKWISE_PACK_PROVIDER";
const SIZES_FILE_VAR: &str = "PACKWISE_PACK_SIZES_FILE";
const SIZES_LIST_VAR: &str = "PACKWISE_PACK_SIZES";
const DEFAULT_SIZES_FILE: &str = "./packs.csv";

fn size_source_from_env() -> SizeSourceConfig {
    size_source_from(
        env_string(PROVIDER_VAR),
        env_string(SIZES_FILE_VAR),
        env_string(SIZES_LIST_VAR),
    )
}

/// Picks the size source from the raw provider, file and list settings.
fn size_source_from(
    provider: Option<String>,
    file: Option<String>,
    list: Option<String>,
) -> SizeSourceConfig {
    let provider = provider.unwrap_or_else(|| "file".to_string());
    let file_config = move || {
        SizeSourceConfig::File(PathBuf::from(
            file.unwrap_or_else(|| DEFAULT_SIZES_FILE.to_string()),
        ))
    };

    match provider.to_ascii_lowercase().as_str() {
        "file" => file_config(),
        "env" => {
            let raw = list.unwrap_or_default();
            match parse_pack_sizes(&raw) {
                Ok(sizes) => SizeSourceConfig::Static(sizes),
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. No pack sizes configured.",
                        SIZES_LIST_VAR, raw, err
                    );
                    SizeSourceConfig::Static(Vec::new())
                }
            }
        }
        other => {
            warn!(
                "Unknown {} '{}'. Expected 'file' or 'env'. Using file.",
                PROVIDER_VAR, other
            );
            file_config()
        }
    }
}

/// Configuration for the pack combination solver.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    packing: PackingConfig,
}

impl SolverConfig {
    const GCD_SCALING_VAR: &'static str = "PACKWISE_SOLVER_GCD_SCALING";
    const MAX_SPAN_VAR: &'static str = "PACKWISE_SOLVER_MAX_SEARCH_SPAN";

    fn from_env() -> Self {
        Self::from_raw(
            env_string(Self::GCD_SCALING_VAR),
            env_string(Self::MAX_SPAN_VAR),
        )
    }

    fn from_raw(gcd_scaling: Option<String>, max_search_span: Option<String>) -> Self {
        let gcd_scaling = gcd_scaling
            .and_then(|raw| parse_bool(&raw, Self::GCD_SCALING_VAR))
            .unwrap_or(PackingConfig::DEFAULT_GCD_SCALING);
        if !gcd_scaling {
            info!("GCD scaling disabled; solver windows grow with the raw quantity");
        }

        let max_search_span = match max_search_span {
            Some(raw) => parse_validated(
                &raw,
                Self::MAX_SPAN_VAR,
                PackingConfig::DEFAULT_MAX_SEARCH_SPAN,
                |value| (1..=PackingConfig::MAX_SEARCH_SPAN_CEILING).contains(&value),
                "must be between 1 and 4294967295",
            ),
            None => PackingConfig::DEFAULT_MAX_SEARCH_SPAN,
        };

        let packing = PackingConfig::builder()
            .gcd_scaling(gcd_scaling)
            .max_search_span(max_search_span)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_with_warning<T>(
    var_name: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Copy + Display,
    T::Err: Display,
{
    match env_string(var_name) {
        Some(raw) => parse_validated(&raw, var_name, default, validator, invalid_hint),
        None => default,
    }
}

fn parse_validated<T>(
    raw: &str,
    var_name: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Copy + Display,
    T::Err: Display,
{
    match raw.parse::<T>() {
        Ok(value) if validator(value) => value,
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}'): {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        for raw in ["1", "true", "yes", "y", "on", "TRUE", "Yes", " true ", "  1  "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for raw in ["0", "false", "no", "n", "off", "FALSE", "OFF", " false "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_validated_accepts_valid_values() {
        assert_eq!(parse_validated("9090", "PORT", 8080u16, |v| v != 0, "hint"), 9090);
        assert_eq!(
            parse_validated("500", "SPAN", 10u64, |v| v > 0, "hint"),
            500
        );
    }

    #[test]
    fn test_parse_validated_falls_back_to_default() {
        assert_eq!(parse_validated("0", "PORT", 8080u16, |v| v != 0, "hint"), 8080);
        assert_eq!(parse_validated("abc", "PORT", 8080u16, |v| v != 0, "hint"), 8080);
        assert_eq!(parse_validated("70000", "PORT", 8080u16, |v| v != 0, "hint"), 8080);
        assert_eq!(parse_validated("-1", "SPAN", 10u64, |v| v > 0, "hint"), 10);
    }

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_size_source_defaults_to_file() {
        assert_eq!(
            size_source_from(None, None, None),
            SizeSourceConfig::File(PathBuf::from("./packs.csv"))
        );
        assert_eq!(
            size_source_from(some("FILE"), some("/etc/packs.csv"), some("1,2")),
            SizeSourceConfig::File(PathBuf::from("/etc/packs.csv"))
        );
    }

    #[test]
    fn test_size_source_env_list() {
        assert_eq!(
            size_source_from(some("env"), some("/ignored.csv"), some("500;250,250")),
            SizeSourceConfig::Static(vec![250, 500])
        );
        assert_eq!(
            size_source_from(some("env"), None, None),
            SizeSourceConfig::Static(vec![])
        );
    }

    #[test]
    fn test_size_source_env_list_unparsable_is_empty() {
        assert_eq!(
            size_source_from(some("env"), None, some("250,abc")),
            SizeSourceConfig::Static(vec![])
        );
        assert_eq!(
            size_source_from(some("env"), None, some("250,-5")),
            SizeSourceConfig::Static(vec![])
        );
    }

    #[test]
    fn test_size_source_unknown_provider_falls_back_to_file() {
        assert_eq!(
            size_source_from(some("redis"), some("sizes.txt"), some("1")),
            SizeSourceConfig::File(PathBuf::from("sizes.txt"))
        );
    }

    #[test]
    fn test_solver_config_defaults() {
        let config = SolverConfig::from_raw(None, None).packing_config();
        assert_eq!(config, PackingConfig::default());
    }

    #[test]
    fn test_solver_config_reads_knobs() {
        let config = SolverConfig::from_raw(some("off"), some("5000")).packing_config();
        assert!(!config.gcd_scaling);
        assert_eq!(config.max_search_span, 5000);
    }

    #[test]
    fn test_solver_config_rejects_bad_knobs() {
        let config = SolverConfig::from_raw(some("maybe"), some("0")).packing_config();
        assert_eq!(config.gcd_scaling, PackingConfig::DEFAULT_GCD_SCALING);
        assert_eq!(config.max_search_span, PackingConfig::DEFAULT_MAX_SEARCH_SPAN);

        let config = SolverConfig::from_raw(None, some("4294967296")).packing_config();
        assert_eq!(config.max_search_span, PackingConfig::DEFAULT_MAX_SEARCH_SPAN);

        let config = SolverConfig::from_raw(None, some("lots")).packing_config();
        assert_eq!(config.max_search_span, PackingConfig::DEFAULT_MAX_SEARCH_SPAN);
    }

    #[test]
    fn test_api_config_new() {
        let config = ApiConfig::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            3000,
            Duration::from_secs(2),
        );
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.binds_to_all_interfaces());
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.display_host(), "127.0.0.1");
        assert_eq!(config.port(), 3000);

        let all = ApiConfig::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080, Duration::from_secs(1));
        assert!(all.binds_to_all_interfaces());
        assert_eq!(all.display_host(), "0.0.0.0");
    }
}
