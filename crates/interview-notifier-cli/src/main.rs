//! Interview notifier CLI - email candidates listed in a spreadsheet

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use interview_notifier::prelude::*;
use interview_notifier::{diagnose, format_body, Field, MailClient, RowReport, Selection};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

const DEFAULT_TABLE: &str = "interviews.xlsx";
const DEFAULT_TEMPLATE_FILE: &str = "interview_template.xlsx";
const RULE_WIDTH: usize = 70;

#[derive(Parser)]
#[command(name = "notify-interviews")]
#[command(
    author,
    version,
    about = "Send interview notifications to candidates listed in a spreadsheet"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which column was detected for each field
    Detect {
        /// Table file (xlsx, xlsm, csv, tsv)
        #[arg(default_value = DEFAULT_TABLE)]
        input: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,
    },

    /// List the rows a send would notify, skip or reject
    Preview {
        /// Table file (xlsx, xlsm, csv, tsv)
        #[arg(default_value = DEFAULT_TABLE)]
        input: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Print the rendered message for each pending row
        #[arg(long)]
        show_body: bool,
    },

    /// Email every pending row and mark it Sent
    Send {
        /// Table file (xlsx, xlsm, csv, tsv)
        #[arg(default_value = DEFAULT_TABLE)]
        input: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Activity log file (overrides the configuration)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Mail client (overrides the configuration)
        #[arg(long, value_parser = parse_client)]
        client: Option<MailClient>,

        /// Mark each row before sending it instead of after
        #[arg(long)]
        mark_first: bool,
    },

    /// Check that the mail client is ready to send
    Doctor {
        /// Mail client (overrides the configuration)
        #[arg(long, value_parser = parse_client)]
        client: Option<MailClient>,
    },

    /// Write a table with the expected headers and sample rows
    Template {
        /// Output file (xlsx, csv, tsv)
        #[arg(default_value = DEFAULT_TEMPLATE_FILE)]
        output: PathBuf,

        /// Use an alternate header layout (alternate1, alternate2, alternate3)
        #[arg(long)]
        demo: Option<TemplateLayout>,
    },
}

/// Manual column choices layered over detection
#[derive(Args, Debug, Default)]
struct ColumnArgs {
    /// Header of the candidate email column
    #[arg(long, value_name = "HEADER")]
    email_column: Option<String>,

    /// Header of the interview date column
    #[arg(long, value_name = "HEADER")]
    date_column: Option<String>,

    /// Header of the interview time column
    #[arg(long, value_name = "HEADER")]
    time_column: Option<String>,

    /// Header of the interview description column
    #[arg(long, value_name = "HEADER")]
    description_column: Option<String>,

    /// Header of the status column
    #[arg(long, value_name = "HEADER", conflicts_with = "no_status")]
    status_column: Option<String>,

    /// Treat the table as having no status column; sent rows are not marked
    #[arg(long)]
    no_status: bool,
}

impl ColumnArgs {
    fn apply(&self, session: &mut Session) -> Result<()> {
        let overrides = [
            (Field::Email, &self.email_column),
            (Field::Date, &self.date_column),
            (Field::Time, &self.time_column),
            (Field::Description, &self.description_column),
            (Field::Status, &self.status_column),
        ];
        for (field, header) in overrides {
            if let Some(header) = header {
                session
                    .assign(field, header)
                    .with_context(|| format!("Cannot use '{}' as the {} column", header, field))?;
            }
        }
        if self.no_status {
            session.unassign(Field::Status);
        }
        Ok(())
    }
}

fn parse_client(s: &str) -> std::result::Result<MailClient, String> {
    match s {
        "sendmail" => Ok(MailClient::Sendmail),
        "apple-mail" => Ok(MailClient::AppleMail),
        other => Err(format!(
            "unknown mail client '{}' (expected sendmail or apple-mail)",
            other
        )),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect { input, columns } => detect(&input, &columns, &config),
        Commands::Preview {
            input,
            columns,
            show_body,
        } => preview(&input, &columns, &config, show_body),
        Commands::Send {
            input,
            columns,
            log_file,
            client,
            mark_first,
        } => {
            let mut config = config;
            if let Some(log_file) = log_file {
                config.log_file = log_file;
            }
            if let Some(client) = client {
                config.mail.client = client;
            }
            if mark_first {
                config.persist_order = PersistOrder::MarkThenSend;
            }
            send(&input, &columns, &config)
        }
        Commands::Doctor { client } => {
            let mut config = config;
            if let Some(client) = client {
                config.mail.client = client;
            }
            doctor(&config)
        }
        Commands::Template { output, demo } => template(&output, demo),
    }
}

fn open(input: &Path, columns: &ColumnArgs, config: &AppConfig) -> Result<Notifier> {
    let mut notifier = Notifier::open(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?
        .with_options(config.run_options());
    columns.apply(notifier.session_mut())?;
    Ok(notifier)
}

fn detect(input: &Path, columns: &ColumnArgs, config: &AppConfig) -> Result<()> {
    let notifier = open(input, columns, config)?;
    let session = notifier.session();
    let mapping = session.mapping();

    println!("File: {}", input.display());
    println!("Rows: {}", session.table().row_count());
    println!();
    for field in Field::ALL {
        match mapping.get(field) {
            Some(column) => println!(
                "  {:<12} column {:<3} '{}'",
                field.as_str(),
                column.index + 1,
                column.header
            ),
            None => println!("  {:<12} (not found)", field.as_str()),
        }
    }

    for (column, fields) in mapping.conflicts() {
        let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
        println!(
            "\nWarning: column '{}' is mapped to more than one field: {}",
            column.header,
            names.join(", ")
        );
    }

    let missing = mapping.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        println!(
            "\nMissing: {}. Every row will be rejected until these are mapped \
             (use --{}-column).",
            names.join(", "),
            missing[0]
        );
    }
    if mapping.get(Field::Status).is_none() && !columns.no_status {
        println!(
            "\nNo status column; `send` will add a '{}' column when it marks the first row.",
            interview_notifier::STATUS_HEADER
        );
    }
    Ok(())
}

fn preview(input: &Path, columns: &ColumnArgs, config: &AppConfig, show_body: bool) -> Result<()> {
    let notifier = open(input, columns, config)?;
    let selection = notifier.session().select();

    print_pending(&selection);
    print_outcomes("Skipped", selection.skipped.iter());
    print_outcomes("Rejected", selection.rejected.iter());

    if show_body {
        let template = &config.template;
        for record in &selection.pending {
            println!("\n{}", "=".repeat(RULE_WIDTH));
            println!("To:      {}", record.email);
            println!("Subject: {}", template.subject());
            println!("{}", "-".repeat(RULE_WIDTH));
            println!("{}", format_body(record, template));
        }
    }
    Ok(())
}

fn print_pending(selection: &Selection) {
    if selection.pending.is_empty() {
        println!("No pending interviews found.");
        println!("All interviews have already been sent or the file is empty.");
        return;
    }

    println!("Found {} pending interview(s):", selection.pending.len());
    for record in &selection.pending {
        println!(
            "  Row {:<4} {:<32} {} {}  {}",
            record.row_index, record.email, record.date, record.time, record.description
        );
    }
}

fn print_outcomes<'a>(title: &str, reports: impl Iterator<Item = &'a RowReport>) {
    let reports: Vec<&RowReport> = reports.collect();
    if reports.is_empty() {
        return;
    }
    println!("\n{} ({}):", title, reports.len());
    for report in reports {
        let email = if report.email.is_empty() {
            "(no email)"
        } else {
            report.email.as_str()
        };
        println!("  Row {:<4} {:<32} {}", report.row_index, email, report.outcome);
    }
}

fn send(input: &Path, columns: &ColumnArgs, config: &AppConfig) -> Result<()> {
    let mut notifier = open(input, columns, config)?;
    let mut log = FileActivityLog::open(&config.log_file)
        .with_context(|| format!("Cannot write log file '{}'", config.log_file.display()))?;
    let mut mailer = dispatcher(&config.mail);

    let pending = notifier.session().select().pending.len();
    if pending == 0 {
        println!("No pending interviews found.");
    } else {
        println!("Found {} pending interview(s) to send", pending);
    }

    let report = if columns.no_status {
        notifier.send_unmarked(&mut mailer, &mut log)
    } else {
        notifier.send(&mut mailer, &mut log)
    }
    .context("Run aborted; no emails were sent")?;

    println!("{}", "-".repeat(RULE_WIDTH));
    for row in &report.reports {
        let mut line = format!("  Row {:<4} {:<32} {}", row.row_index, row.email, row.outcome);
        if let Some(detail) = &row.detail {
            line.push_str(&format!(": {}", detail));
        }
        println!("{}", line);
    }
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("  Total Emails Sent:     {}", report.summary.sent);
    println!("  Total Failed:          {}", report.summary.failed);
    println!("  Total Skipped:         {}", report.summary.skipped);
    println!("  Log File:              {}", config.log_file.display());
    println!("{}", "=".repeat(RULE_WIDTH));

    if report.summary.failed > 0 {
        tracing::warn!(failed = report.summary.failed, "Some rows were not notified; see the log");
    }
    Ok(())
}

fn doctor(config: &AppConfig) -> Result<()> {
    let diagnosis = diagnose(&config.mail);
    println!("Mail client: {:?}", diagnosis.client);
    for check in &diagnosis.checks {
        println!("{}", check);
    }

    if !diagnosis.is_ready() {
        bail!("Mail client is not ready");
    }
    println!("\nMail client is ready to use.");
    Ok(())
}

fn template(output: &Path, demo: Option<TemplateLayout>) -> Result<()> {
    let layout = demo.unwrap_or_default();
    let today = chrono::Local::now().date_naive();
    write_template(output, layout, today)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    println!("Wrote {} template to '{}'", layout, output.display());
    println!("Headers: {}", layout.headers().join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use interview_notifier::Table;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_defaults() {
        let cli = Cli::try_parse_from(["notify-interviews", "send"]).unwrap();
        match cli.command {
            Commands::Send {
                input,
                mark_first,
                columns,
                ..
            } => {
                assert_eq!(input, PathBuf::from("interviews.xlsx"));
                assert!(!mark_first);
                assert!(!columns.no_status);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_status_flags_conflict() {
        assert!(Cli::try_parse_from([
            "notify-interviews",
            "send",
            "a.csv",
            "--status-column",
            "Sent",
            "--no-status",
        ])
        .is_err());
    }

    #[test]
    fn test_template_demo_layout() {
        let cli =
            Cli::try_parse_from(["notify-interviews", "template", "demo.xlsx", "--demo", "alternate2"])
                .unwrap();
        match cli.command {
            Commands::Template { demo, .. } => assert_eq!(demo, Some(TemplateLayout::Alternate2)),
            _ => panic!("expected template"),
        }
    }

    #[test]
    fn test_column_overrides_apply() {
        let table = Table::from_grid(vec![
            vec!["Contact".into(), "Day".into(), "Slot".into(), "Notes".into(), "Status".into()],
            vec!["a@x.com".into(), "2025-01-01".into(), "10:00".into(), "Tech".into(), "".into()],
        ]);
        let mut session = Session::new(table);
        let columns = ColumnArgs {
            email_column: Some("Contact".to_string()),
            date_column: Some("Day".to_string()),
            time_column: Some("Slot".to_string()),
            description_column: Some("Notes".to_string()),
            no_status: true,
            ..ColumnArgs::default()
        };
        columns.apply(&mut session).unwrap();

        assert_eq!(session.mapping().index(Field::Email), Some(0));
        assert_eq!(session.mapping().index(Field::Description), Some(3));
        assert_eq!(session.mapping().index(Field::Status), None);
        assert_eq!(session.select().pending.len(), 1);
    }

    #[test]
    fn test_unknown_override_header() {
        let table = Table::from_grid(vec![vec!["Email".into()]]);
        let mut session = Session::new(table);
        let columns = ColumnArgs {
            date_column: Some("When".to_string()),
            ..ColumnArgs::default()
        };
        assert!(columns.apply(&mut session).is_err());
    }

    #[test]
    fn test_parse_client() {
        assert_eq!(parse_client("apple-mail"), Ok(MailClient::AppleMail));
        assert!(parse_client("outlook").is_err());
    }
}
