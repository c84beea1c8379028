//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists. Variables already set in the
    /// process environment win over the file.
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No {} file found, using config file, defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Frequency Sweep Tester Configuration
#
# Values here are used when the matching command-line option is not given.
# Thresholds can also come from config.json.

# Access point (RouterOS API)
# AP_ADDRESS=192.168.88.1
# AP_PORT=8728
# AP_USERNAME=admin
# AP_PASSWORD=

# Station that must re-register after every frequency change
# STATION_ADDRESS=192.168.88.2

# Frequencies to sweep in MHz, stepped by 5
# FREQUENCY_RANGE=4900-6100

# Seconds to wait for the station after a frequency change
# WAIT_FOR_REGISTRATION=30

# Average ping (ms) must stay below this value
# VALID_PING_TIME=15

# Signal strength (dBm) must be above this value
# SIGNAL_THRESHOLD=-70

# Results file, appended to after every frequency
# RESULTS_FILE=Results.txt

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Diagnostic log lines as text or json
# LOG_FORMAT=text
"#
        .to_string()
    }

    /// Write the example file for `--create-env`; an existing file is left alone
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(AppError::config(format!("{} already exists, not overwriting it", path.display())));
        }
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::io(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("AP_ADDRESS", "Access point IP address", "192.168.88.1"),
            ("AP_PORT", "RouterOS API port", "8728"),
            ("AP_USERNAME", "Access point login", "admin"),
            ("AP_PASSWORD", "Access point password", "secret"),
            ("STATION_ADDRESS", "Station IP address", "192.168.88.2"),
            ("FREQUENCY_RANGE", "Sweep range in MHz", "5170-5330"),
            ("WAIT_FOR_REGISTRATION", "Registration window in seconds", "30"),
            ("VALID_PING_TIME", "Ping threshold in milliseconds", "15"),
            ("SIGNAL_THRESHOLD", "Signal threshold in dBm", "-70"),
            ("RESULTS_FILE", "Results file path", "Results.txt"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_FORMAT", "Diagnostic log format (text, json)", "json"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. config.json\n");
        help.push_str("  5. Default values\n");

        help
    }
}
