use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use sheetcol::{Cli, OutputFormatter, OutputMode, SheetCol, SheetColError, UserFriendlyError};
use std::io::IsTerminal;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    // The graphical front-end is launched with no arguments; it ships separately
    if std::env::args_os().len() <= 1 {
        return handle_no_arguments();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return parse_error_exit_code(e.kind());
        }
    };

    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let sheetcol = match SheetCol::from_cli(&cli) {
        Ok(sheetcol) => sheetcol,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    match sheetcol.run().await {
        // Per-file failures are reported and logged, not fatal
        Ok(_) => 0,
        Err(e) => {
            sheetcol.handle_error(&e);
            1
        }
    }
}

fn handle_no_arguments() -> i32 {
    println!("The graphical interface is not bundled with this build; use the command line.");
    println!();
    let _ = Cli::command().print_help();
    println!();
    0
}

fn parse_error_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

fn setup_logging(cli: &Cli) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .try_init();
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "sheetcol.toml".to_string());

    match SheetCol::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  sheetcol <COLUMN_NAME> <FOLDER_PATH> --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &SheetColError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "sheetcol",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[csv]"));
    }

    #[test]
    fn test_parse_error_exit_codes() {
        assert_eq!(parse_error_exit_code(ErrorKind::DisplayHelp), 0);
        assert_eq!(parse_error_exit_code(ErrorKind::DisplayVersion), 0);
        assert_eq!(parse_error_exit_code(ErrorKind::InvalidValue), 1);
        assert_eq!(parse_error_exit_code(ErrorKind::MissingRequiredArgument), 1);
    }
}
