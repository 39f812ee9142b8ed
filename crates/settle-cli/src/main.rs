use camino::Utf8PathBuf;
use clap::Parser;
use owo_colors::OwoColorize;
use std::process::ExitCode;

mod config;
mod output;

use config::{ConfigError, Overrides, Settings};

/// Converge a Postgres cluster to a declared schema.
///
/// Creates whatever the schema description declares and the cluster lacks.
/// Never drops tables, columns or types.
#[derive(Parser, Debug)]
#[command(name = "settle", version)]
struct Cli {
    /// Schema description document (.styx, .json or .yml)
    #[arg(long)]
    schema: Option<Utf8PathBuf>,

    /// Postgres host
    #[arg(long)]
    host: Option<String>,

    /// Postgres port
    #[arg(long)]
    port: Option<u16>,

    /// Postgres user
    #[arg(long)]
    user: Option<String>,

    /// Database holding the audit ledger
    #[arg(long)]
    ledger_database: Option<String>,

    /// Don't record outcomes in the audit ledger
    #[arg(long)]
    no_ledger: bool,

    /// Log every statement sent to the server
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let directive = if cli.verbose {
        "settle=debug"
    } else {
        "settle=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().expect("static directive")),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = match config::load() {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(ConfigError::NotFound) => config::Config::default(),
        Err(e) => return Err(e.into()),
    };

    let overrides = Overrides {
        schema: cli.schema,
        host: cli.host,
        port: cli.port,
        user: cli.user,
        ledger_database: cli.ledger_database,
        no_ledger: cli.no_ledger,
    };
    let settings = Settings::resolve(
        file,
        |key| std::env::var(key).ok(),
        overrides,
        |path| path.exists(),
    )?;

    let loaded = settle_schema::load(&settings.schema)?;
    for diagnostic in &loaded.diagnostics {
        output::diagnostic(diagnostic);
    }

    let connection = &settings.run.connection;
    println!(
        "{} {} ({}@{}:{})",
        "settling".bold(),
        settings.schema,
        connection.user,
        connection.host,
        connection.port
    );

    let report =
        settle::run_with_progress(&settings.run, &loaded.schema, Some(output::progress())).await?;
    output::report(&report);
    if let Some(reason) = report.aborted {
        return Err(format!("connection lost mid-run: {reason}").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "settle",
            "--schema",
            "shop.styx",
            "--port",
            "6543",
            "--no-ledger",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.schema.unwrap(), "shop.styx");
        assert_eq!(cli.port, Some(6543));
        assert!(cli.no_ledger);
        assert!(cli.verbose);
    }
}
