//! Interactive collection of sweep settings
//!
//! Uses the dialoguer crate when the `dialoguer` feature is enabled and
//! falls back to plain line input otherwise.

use crate::cli::Cli;
use crate::error::{AppError, Result};
use crate::models::{Config, FrequencyRange};
use crate::types::{Direction, Protocol, RateLimit};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::net::IpAddr;
use std::str::FromStr;

/// Source of answers for the interactive prompts
pub trait LineInput {
    /// Ask one question. An empty answer selects `default` when given.
    fn read_value(&mut self, prompt: &str, default: Option<&str>, secret: bool) -> Result<String>;

    /// Tell the user an answer was rejected
    fn notify_invalid(&mut self, message: &str) -> Result<()>;
}

/// Line based input over any reader and writer
pub struct StdioInput<R, W> {
    input: R,
    output: W,
    use_colors: bool,
}

impl<R: BufRead, W: Write> StdioInput<R, W> {
    pub fn new(input: R, output: W, use_colors: bool) -> Self {
        Self {
            input,
            output,
            use_colors,
        }
    }
}

impl<R: BufRead, W: Write> LineInput for StdioInput<R, W> {
    /// Plain line input cannot hide typing; secrets say so and never show their default
    fn read_value(&mut self, prompt: &str, default: Option<&str>, secret: bool) -> Result<String> {
        let label = match (secret, default) {
            (true, Some(_)) => format!("{} (input is visible) [keep current]:", prompt),
            (true, None) => format!("{} (input is visible):", prompt),
            (false, Some(value)) => format!("{} [{}]:", prompt, value),
            (false, None) => format!("{}:", prompt),
        };
        if self.use_colors {
            use colored::Colorize;
            write!(self.output, "{} ", label.bold())?;
        } else {
            write!(self.output, "{} ", label)?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AppError::io("Input closed before all settings were entered"));
        }

        let answer = line.trim();
        match (answer.is_empty(), default) {
            (true, Some(value)) => Ok(value.to_string()),
            _ => Ok(answer.to_string()),
        }
    }

    fn notify_invalid(&mut self, message: &str) -> Result<()> {
        if self.use_colors {
            use colored::Colorize;
            writeln!(self.output, "{} {}", "[INVALID]".red().bold(), message)?;
        } else {
            writeln!(self.output, "[INVALID] {}", message)?;
        }
        Ok(())
    }
}

/// Prompts backed by dialoguer
#[cfg(feature = "dialoguer")]
pub struct DialoguerInput;

#[cfg(feature = "dialoguer")]
impl LineInput for DialoguerInput {
    fn read_value(&mut self, prompt: &str, default: Option<&str>, secret: bool) -> Result<String> {
        use dialoguer::{Input, Password};

        if secret {
            return Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
                .map_err(|e| AppError::io(format!("Input failed: {}", e)));
        }

        let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(default.is_none());
        if let Some(value) = default {
            input = input.default(value.to_string());
        }
        input
            .interact_text()
            .map_err(|e| AppError::io(format!("Input failed: {}", e)))
    }

    fn notify_invalid(&mut self, message: &str) -> Result<()> {
        eprintln!("{}", message);
        Ok(())
    }
}

/// Collects the settings the command line left open
pub struct InteractivePrompt {
    use_colors: bool,
    use_enhanced: bool,
}

impl InteractivePrompt {
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            use_enhanced: cfg!(feature = "dialoguer"),
        }
    }

    /// Prompt on the terminal for every setting not given on the command
    /// line
    pub fn collect(&self, config: &mut Config, cli: &Cli) -> Result<()> {
        self.print_banner();

        #[cfg(feature = "dialoguer")]
        if self.use_enhanced {
            return Self::fill_missing(config, cli, &mut DialoguerInput);
        }

        let stdin = io::stdin();
        let mut input = StdioInput::new(stdin.lock(), io::stdout(), self.use_colors);
        Self::fill_missing(config, cli, &mut input)
    }

    fn print_banner(&self) {
        if self.use_colors {
            use colored::Colorize;
            println!("\n{}", "Frequency Sweep Tester".cyan().bold());
        } else {
            println!("\nFrequency Sweep Tester");
        }
        if !self.use_enhanced {
            println!("Press Enter to keep the value shown in brackets.\n");
        }
    }

    /// Ask for each open setting; current config values are the defaults
    pub fn fill_missing(config: &mut Config, cli: &Cli, input: &mut dyn LineInput) -> Result<()> {
        if cli.ap.is_none() {
            config.ap_address = Some(ask::<IpAddr>(input, "AP IP address", config.ap_address.map(|a| a.to_string()))?);
        }
        if cli.username.is_none() {
            config.ap_username = ask::<String>(input, "AP username", Some(config.ap_username.clone()))?;
        }
        if cli.password.is_none() && config.ap_password.is_empty() {
            config.ap_password = input.read_value("AP password", None, true)?;
        }
        if cli.port.is_none() {
            config.ap_port = ask::<u16>(input, "AP port", Some(config.ap_port.to_string()))?;
        }
        if cli.range.is_none() {
            config.frequency_range = ask::<FrequencyRange>(input, "Frequency range", Some(config.frequency_range.to_string()))?;
        }
        if cli.station.is_none() {
            config.station_address =
                Some(ask::<IpAddr>(input, "Station IP address", config.station_address.map(|a| a.to_string()))?);
        }
        if cli.protocol.is_none() {
            config.bandwidth.protocol =
                ask::<Protocol>(input, "Protocol (1 tcp / 2 udp)", Some(config.bandwidth.protocol.to_string()))?;
        }
        if cli.direction.is_none() {
            config.bandwidth.direction = ask::<Direction>(
                input,
                "Direction (1 send / 2 receive / 3 both)",
                Some(config.bandwidth.direction.to_string()),
            )?;
        }
        if cli.local_limit.is_none() {
            config.bandwidth.local_limit =
                ask::<RateLimit>(input, "Local TX limit in Mbps", Some(limit_default(config.bandwidth.local_limit)))?;
        }
        if cli.remote_limit.is_none() {
            config.bandwidth.remote_limit =
                ask::<RateLimit>(input, "Remote TX limit in Mbps", Some(limit_default(config.bandwidth.remote_limit)))?;
        }
        if cli.duration.is_none() {
            config.bandwidth.duration_seconds = loop {
                let seconds = ask::<u32>(input, "Test duration in seconds", Some(config.bandwidth.duration_seconds.to_string()))?;
                if seconds > 0 {
                    break seconds;
                }
                input.notify_invalid("Duration must be greater than 0")?;
            };
        }

        Ok(())
    }
}

/// A limit written the way its parser accepts it back
fn limit_default(limit: RateLimit) -> String {
    match limit {
        RateLimit::Unlimited => "unlimited".to_string(),
        RateLimit::Mbps(mbps) => mbps.to_string(),
    }
}

/// Ask until the answer parses
fn ask<T>(input: &mut dyn LineInput, prompt: &str, default: Option<String>) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    loop {
        let answer = input.read_value(prompt, default.as_deref(), false)?;
        match answer.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => input.notify_invalid(&format!("'{}' is not valid: {}", answer, e))?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(cli: &Cli, config: &mut Config, answers: &str) -> (Result<()>, String) {
        let mut output = Vec::new();
        let result = {
            let mut input = StdioInput::new(Cursor::new(answers.as_bytes().to_vec()), &mut output, false);
            InteractivePrompt::fill_missing(config, cli, &mut input)
        };
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_prompts_for_everything_missing() {
        let mut config = Config::default();
        let answers = "10.0.0.1\ntester\nsecret\n\n5170-5330\n10.0.0.2\n2\n1\n50\n\n15\n";

        let (result, transcript) = run(&Cli::default(), &mut config, answers);
        result.unwrap();

        assert_eq!(config.ap_address, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(config.ap_username, "tester");
        assert_eq!(config.ap_password, "secret");
        assert_eq!(config.ap_port, 8728);
        assert_eq!(config.frequency_range, FrequencyRange { start: 5170, end: 5330 });
        assert_eq!(config.station_address, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(config.bandwidth.protocol, Protocol::Udp);
        assert_eq!(config.bandwidth.direction, Direction::Send);
        assert_eq!(config.bandwidth.local_limit, RateLimit::Mbps(50));
        assert_eq!(config.bandwidth.remote_limit, RateLimit::Unlimited);
        assert_eq!(config.bandwidth.duration_seconds, 15);
        assert!(transcript.contains("AP port [8728]:"));
        assert!(transcript.contains("AP password (input is visible):"));
    }

    #[test]
    fn test_secret_default_is_not_echoed() {
        let mut output = Vec::new();
        let value = {
            let mut input = StdioInput::new(Cursor::new(b"\n".to_vec()), &mut output, false);
            input.read_value("AP password", Some("hunter2"), true).unwrap()
        };
        let transcript = String::from_utf8(output).unwrap();

        assert_eq!(value, "hunter2");
        assert_eq!(transcript, "AP password (input is visible) [keep current]: ");
    }

    #[test]
    fn test_cli_values_are_not_asked_again() {
        let cli = Cli {
            ap: Some("10.0.0.1".parse().unwrap()),
            username: Some("admin".to_string()),
            password: Some(String::new()),
            port: Some(8728),
            range: Some(FrequencyRange { start: 5000, end: 5010 }),
            station: Some("10.0.0.2".parse().unwrap()),
            protocol: Some(Protocol::Tcp),
            direction: Some(Direction::Both),
            local_limit: Some(RateLimit::Unlimited),
            remote_limit: Some(RateLimit::Unlimited),
            duration: Some(10),
            ..Cli::default()
        };
        let mut config = Config::default();

        let (result, transcript) = run(&cli, &mut config, "");
        result.unwrap();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_invalid_answer_is_asked_again() {
        let cli = Cli {
            ap: Some("10.0.0.1".parse().unwrap()),
            username: Some("admin".to_string()),
            password: Some(String::new()),
            port: Some(8728),
            range: Some(FrequencyRange { start: 5000, end: 5010 }),
            station: Some("10.0.0.2".parse().unwrap()),
            direction: Some(Direction::Both),
            local_limit: Some(RateLimit::Unlimited),
            remote_limit: Some(RateLimit::Unlimited),
            duration: Some(10),
            ..Cli::default()
        };
        let mut config = Config::default();

        let (result, transcript) = run(&cli, &mut config, "icmp\n2\n");
        result.unwrap();
        assert_eq!(config.bandwidth.protocol, Protocol::Udp);
        assert!(transcript.contains("[INVALID] 'icmp' is not valid"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut config = Config::default();
        let (result, _) = run(&Cli::default(), &mut config, "10.0.0.1\n");
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
