use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spendlens_core::StatementTransaction;
use spendlens_ingest::StatementKind;
use spendlens_report::{
    write_transactions_csv, AnalyzeRequest, ErrorBody, ReportFormat, StatementReport,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod server;
mod state;

#[derive(Parser, Debug)]
#[command(name = "spendlens", version, about = "Bank and UPI statement analyzer")]
struct Cli {
    /// Config file (default: ~/.spendlens/config.toml)
    #[arg(long, global = true, env = "SPENDLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (logs go to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a statement PDF and print the report
    Analyze {
        pdf: PathBuf,

        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Password for an encrypted PDF
        #[arg(long, env = "SPENDLENS_PDF_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long, value_enum, default_value_t = Output::Json)]
        output: Output,

        #[arg(long, default_value_t = false)]
        pretty: bool,
    },

    /// Classify and aggregate a JSON array of transactions
    Summarize {
        ledger: PathBuf,

        #[arg(long, value_enum, default_value_t = Output::Json)]
        output: Output,

        #[arg(long, default_value_t = false)]
        pretty: bool,
    },

    /// Print the category for each description
    Classify {
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Run the HTTP server
    Serve {
        /// Overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Csv,
    Summary,
}

/// Statement layout for `analyze --kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Detect from the statement header
    Auto,
    Kotak,
    #[value(name = "phonepe")]
    PhonePe,
    Generic,
    /// Built-in sample statement; the PDF argument is ignored
    Demo,
}

impl From<KindArg> for StatementKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Auto => StatementKind::Auto,
            KindArg::Kotak => StatementKind::Kotak,
            KindArg::PhonePe => StatementKind::PhonePe,
            KindArg::Generic => StatementKind::Generic,
            KindArg::Demo => StatementKind::Demo,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let config_file = cli.config.as_deref();

    match cli.command {
        Command::Analyze {
            pdf,
            kind,
            password,
            output,
            pretty,
        } => {
            let cfg = config::load_config(config_file)?;
            let kind = StatementKind::from(kind);
            let bytes = if kind == StatementKind::Demo {
                Vec::new()
            } else {
                fs::read(&pdf).with_context(|| format!("read {}", pdf.display()))?
            };

            let analyzer = cfg.analyzer()?;
            let result = analyzer
                .analyze(AnalyzeRequest {
                    pdf: bytes,
                    password,
                    kind,
                })
                .await;
            match result {
                Ok(report) => print_report(&report, output, pretty, analyzer.format())?,
                Err(err) => {
                    print_json(&ErrorBody::from(&err), pretty)?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Summarize {
            ledger,
            output,
            pretty,
        } => {
            let cfg = config::load_config(config_file)?;
            let rows = read_ledger(&ledger)?;
            let analyzer = cfg.analyzer()?;
            match analyzer.analyze_ledger(rows) {
                Ok(report) => print_report(&report, output, pretty, analyzer.format())?,
                Err(err) => {
                    print_json(&ErrorBody::from(&err), pretty)?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Classify { descriptions } => {
            let classifier = config::load_config(config_file)?.classifier()?;
            for d in &descriptions {
                println!("{}\t{}", classifier.classify(d), d);
            }
        }

        Command::Serve { bind } => {
            let cfg = config::load_config(config_file)?;
            server::serve(&cfg, bind).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_file)?,
            ConfigCommand::Show => {
                let cfg = config::load_config(config_file)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_ledger(path: &Path) -> Result<Vec<StatementTransaction>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse ledger {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("serialize JSON")?;
    println!("{s}");
    Ok(())
}

fn print_report(
    report: &StatementReport,
    output: Output,
    pretty: bool,
    format: &ReportFormat,
) -> Result<()> {
    match output {
        Output::Json => print_json(report, pretty),
        Output::Csv => write_transactions_csv(report, std::io::stdout().lock()),
        Output::Summary => {
            print_summary(report, format);
            Ok(())
        }
    }
}

fn print_summary(report: &StatementReport, format: &ReportFormat) {
    let s = &report.summary;
    if let Some(p) = &report.statement_period {
        println!("Period: {} to {}", p.start_date, p.end_date);
    }
    println!(
        "Transactions: {} ({} credits, {} debits, {} listed)",
        s.total_transactions,
        s.credit_count,
        s.debit_count,
        report.transactions.len()
    );
    println!("Received: {}", format.display_amount(s.total_received));
    println!("Spent:    {}", format.display_amount(s.total_spent));
    println!("Balance:  {}", format.display_amount(s.balance));

    if !report.category_breakdown.is_empty() {
        println!("\nBy category:");
        for (category, entry) in &report.category_breakdown {
            println!(
                "  {:<18} {:>14} {:>6}% ({})",
                category.label(),
                format.display_amount(entry.amount),
                entry.percentage,
                entry.count
            );
        }
    }

    if let Some(accounts) = &report.accounts {
        println!("\nAccounts:");
        for a in accounts {
            println!(
                "  {} {}: paid {} ({}), received {} ({})",
                a.account_name,
                a.account_number,
                format.display_amount(a.payments_made.total),
                a.payments_made.count,
                format.display_amount(a.payments_received.total),
                a.payments_received.count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_kind(args: &[&str]) -> Result<StatementKind, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Command::Analyze { kind, .. } => Ok(kind.into()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_kind_defaults_to_auto() {
        let kind = analyze_kind(&["spendlens", "analyze", "s.pdf"]).unwrap();
        assert_eq!(kind, StatementKind::Auto);
    }

    #[test]
    fn test_kind_accepts_known_layouts() {
        let kind = analyze_kind(&["spendlens", "analyze", "s.pdf", "--kind", "phonepe"]).unwrap();
        assert_eq!(kind, StatementKind::PhonePe);
        let kind = analyze_kind(&["spendlens", "analyze", "s.pdf", "--kind", "kotak"]).unwrap();
        assert_eq!(kind, StatementKind::Kotak);
    }

    #[test]
    fn test_unknown_kind_rejected_with_choices() {
        let err = analyze_kind(&["spendlens", "analyze", "s.pdf", "--kind", "hdfc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        assert!(err.to_string().contains("phonepe"));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
