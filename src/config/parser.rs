//! Configuration assembly from defaults, the JSON config file, the
//! environment and CLI arguments

use crate::{
    cli::Cli,
    config::{env::EnvManager, file::ConfigDocument},
    error::Result,
    models::Config,
};

/// Configuration parser that layers every configuration source
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Build the layered configuration without validating it.
    ///
    /// Interactive mode fills the gaps before validation runs.
    pub fn build(&self) -> Result<Config> {
        let mut config = Config::default();

        let (path, explicit) = self.cli.config_path();
        if let Some(document) = ConfigDocument::load_optional(&path, explicit)? {
            document.apply_to(&mut config);
            if self.cli.debug {
                println!("Loaded thresholds from {}", path.display());
            }
        }

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        Ok(config)
    }

    /// Parse, layer and validate the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let config = self.build()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(ap) = cli.ap {
            config.ap_address = Some(ap);
        }
        if let Some(port) = cli.port {
            config.ap_port = port;
        }
        if let Some(username) = &cli.username {
            config.ap_username = username.clone();
        }
        if let Some(password) = &cli.password {
            config.ap_password = password.clone();
        }
        if let Some(station) = cli.station {
            config.station_address = Some(station);
        }
        if let Some(range) = cli.range {
            config.frequency_range = range;
        }
        if let Some(wait) = cli.wait {
            config.wait_for_registration = Some(wait);
        }
        if let Some(ping) = cli.max_ping {
            config.valid_ping_time_ms = Some(ping);
        }
        if let Some(signal) = cli.signal_threshold {
            config.signal_threshold_dbm = signal;
        }
        if let Some(protocol) = cli.protocol {
            config.bandwidth.protocol = protocol;
        }
        if let Some(direction) = cli.direction {
            config.bandwidth.direction = direction;
        }
        if let Some(limit) = cli.local_limit {
            config.bandwidth.local_limit = limit;
        }
        if let Some(limit) = cli.remote_limit {
            config.bandwidth.remote_limit = limit;
        }
        if let Some(duration) = cli.duration {
            config.bandwidth.duration_seconds = duration;
        }
        if let Some(output) = &cli.output {
            config.results_file = output.clone();
        }
        if let Some(format) = cli.log_format {
            config.log_format = format;
        }
        if let Some(format) = cli.format {
            config.report_format = format;
        }

        if cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = cli.verbose || cli.debug;
        config.debug = cli.debug;

        if config.debug {
            println!("Applied CLI overrides to configuration");
            println!(
                "Final config: range={}, wait={:?}s, max_ping={:?}ms, signal>{}dBm",
                config.frequency_range, config.wait_for_registration, config.valid_ping_time_ms, config.signal_threshold_dbm
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let address = |addr: Option<std::net::IpAddr>| addr.map(|a| a.to_string()).unwrap_or_else(|| "(not set)".to_string());

    let mut summary = Vec::new();
    summary.push(format!("Access Point: {}:{}", address(config.ap_address), config.ap_port));
    summary.push(format!("Username: {}", config.ap_username));
    summary.push(format!("Station: {}", address(config.station_address)));
    summary.push(format!(
        "Frequency Range: {} MHz ({} steps)",
        config.frequency_range,
        config.frequency_range.step_count()
    ));
    summary.push(format!(
        "Registration Wait: {}",
        config
            .wait_for_registration
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "(not set)".to_string())
    ));
    summary.push(format!(
        "Ping Threshold: {}",
        config
            .valid_ping_time_ms
            .map(|ms| format!("< {} ms", ms))
            .unwrap_or_else(|| "(not set)".to_string())
    ));
    summary.push(format!("Signal Threshold: > {} dBm", config.signal_threshold_dbm));
    summary.push(format!(
        "Bandwidth Test: {} {} for {}s (local {}, remote {})",
        config.bandwidth.protocol,
        config.bandwidth.direction,
        config.bandwidth.duration_seconds,
        config.bandwidth.local_limit,
        config.bandwidth.remote_limit
    ));
    summary.push(format!("Results File: {} ({:?})", config.results_file.display(), config.report_format));
    summary.push(format!("Log Format: {:?}", config.log_format));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
