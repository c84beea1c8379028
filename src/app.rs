//! Main application orchestration and execution

use crate::{
    cli::{prompt::InteractivePrompt, Cli},
    config::{display_config_summary, validate_config, ConfigParser, EnvManager},
    defaults,
    error::{ErrorContext, Result},
    gateway::RouterOsGateway,
    logging::LoggerFactory,
    models::{Config, SweepConfig},
    output::{ConsoleReporter, ReportContext, ReportFormatterFactory, ResultFileSink, SweepSummary},
    sweep::{SweepController, TestRunner},
};
use futures::StreamExt;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        Ok(Self { cli })
    }

    /// Assemble the configuration, prompting for gaps in interactive mode
    pub fn load_config(&self) -> Result<Config> {
        let parser = ConfigParser::new(self.cli.clone());
        let mut config = parser.build()?;

        if self.cli.interactive {
            InteractivePrompt::new(config.enable_color).collect(&mut config, &self.cli)?;
        }

        Ok(config)
    }

    /// Run the application
    pub async fn run(self) -> Result<SweepSummary> {
        if self.cli.env_help {
            println!("{}", EnvManager::display_env_help());
            return Ok(SweepSummary::new());
        }
        if let Some(path) = &self.cli.create_env {
            EnvManager::save_example_env_file(path)?;
            println!("Wrote example environment file to {}", path.display());
            return Ok(SweepSummary::new());
        }

        let config = self.load_config()?;
        let warnings = validate_config(&config)?;

        if config.debug {
            println!("Configuration Summary:");
            println!("{}\n", display_config_summary(&config));
        }
        if !warnings.is_empty() {
            println!("Configuration Warnings:");
            for warning in &warnings {
                println!("  {}", warning.format(config.enable_color));
            }
            println!();
        }

        let sweep_config = SweepConfig::try_from(&config)?;
        let params = config.bandwidth.clone();
        let reporter = ConsoleReporter::new(config.enable_color, config.verbose);

        if self.cli.dry_run {
            let request = TestRunner::build_request(&params, sweep_config.station_address);
            println!(
                "{}",
                reporter.format_plan(&sweep_config, &params, &request, config.estimated_duration())
            );
            return Ok(SweepSummary::new());
        }

        let factory = LoggerFactory::new(config.clone());
        let app_logger = factory.create_logger("APP").await;
        let sweep_logger = factory.create_sweep_logger().await;

        crate::log_info!(
            app_logger,
            "Connecting to {}:{} as {}",
            sweep_config.ap_address,
            sweep_config.ap_credentials.port,
            sweep_config.ap_credentials.username
        );
        let mut gateway = RouterOsGateway::connect(
            sweep_config.ap_address,
            &sweep_config.ap_credentials,
            defaults::DEFAULT_CONNECT_TIMEOUT,
            defaults::DEFAULT_IO_TIMEOUT,
        )
        .await
        .with_context(|| format!("Access point {}", sweep_config.ap_address))?;

        let mut sink = ResultFileSink::open(
            &config.results_file,
            ReportFormatterFactory::create(config.report_format),
            ReportContext::from(&sweep_config),
        )?;

        println!("{}\n", reporter.format_header(&sweep_config, &params));

        let controller = SweepController::new(sweep_config, params, sweep_logger);
        let mut summary = SweepSummary::new();
        let outcome = {
            let mut results = Box::pin(controller.run(&mut gateway));
            let mut outcome = Ok(());
            while let Some(item) = results.next().await {
                match item.and_then(|result| sink.append(&result).map(|_| result)) {
                    Ok(result) => {
                        println!("{}", reporter.format_result(&result, controller.config()));
                        summary.record(&result);
                    }
                    Err(error) => {
                        outcome = Err(error);
                        break;
                    }
                }
            }
            outcome
        };

        match &outcome {
            Err(error) => crate::log_error!(app_logger, "Sweep stopped early: {}", error),
            Ok(()) if summary.qualified == 0 => {
                crate::log_warn!(app_logger, "No frequency out of {} qualified", summary.total)
            }
            Ok(()) => {}
        }

        println!("\n{}", reporter.format_summary(&summary));
        println!("Results appended to {}", sink.path().display());

        if let Err(error) = gateway.disconnect().await {
            crate::log_debug!(app_logger, "Disconnect failed: {}", error);
        }

        outcome.map(|_| summary)
    }
}
