//! Frequency Sweep Tester - Main CLI Application
//!
//! Sweeps an access point across a frequency range and records which
//! frequencies keep a station registered with good signal and latency.

use clap::Parser;
use freq_sweep_tester::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let use_colors = cli.use_colors();
    let verbose = cli.verbose || cli.debug;
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("Debug mode enabled\n");
    }

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        ErrorReporter::new(use_colors, verbose).report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - wait_for_registration and valid_ping_time come from config.json or --wait/--max-ping");
            eprintln!("  - AP and station addresses must be IP addresses");
            eprintln!("  - Ranges look like 5000-5100 with start <= end");
            eprintln!("  - Run with --dry-run to check the plan without connecting");
        }
        AppError::Connection(_) | AppError::Protocol(_) => {
            eprintln!();
            eprintln!("Connection troubleshooting:");
            eprintln!("  - Check that /ip service api is enabled on the access point");
            eprintln!("  - Verify the API port (default 8728) and firewall rules");
            eprintln!("  - A frequency change can drop a management link that runs over the radio");
        }
        AppError::Auth(_) => {
            eprintln!();
            eprintln!("Login help:");
            eprintln!("  - Check --username/--password or AP_USERNAME/AP_PASSWORD");
            eprintln!("  - The user needs read, write and test policies");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("File help:");
            eprintln!("  - Check that the results file directory exists and is writable");
        }
        _ => {}
    }
}
