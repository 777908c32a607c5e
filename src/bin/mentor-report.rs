//! CLI binary for mentoring-report.
//!
//! A thin shim over the library crate: flags fill a [`Session`], the session
//! does the work, and toasts are printed to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mentoring_report::{
    render_html, render_text, AcademicMetadata, InputMethod, ManualEntry, MetadataField,
    Notification, NotificationSink, PdfEngine, Profile, ProfileStore, ReportConfig, ReportType,
    Session, Severity, SharedSink, TracingSink,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Toasts on the terminal ───────────────────────────────────────────────────

/// Prints each notification as one coloured line on stderr.
struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, n: &Notification) {
        let mark = match n.severity {
            Severity::Success => green("✔"),
            Severity::Warning => yellow("⚠"),
            Severity::Error => red("✘"),
        };
        eprintln!("{} {} {}", mark, bold(&n.title), n.description);
    }
}

fn spinner(prefix: &'static str, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Report from a spreadsheet (first column name, second roll number, rest details)
  mentor-report generate --type subject-attendance --program be-cse-ai \
      --batch 2023 --academic-year 2023-2024 --group 4A \
      --session jan-june-2024 --semester 3 --file attendance.xlsx

  # Report from typed entries
  mentor-report generate --type call-record ... \
      --entry "Alice|101|Called parent, discussed attendance" \
      --entry "Bob|102|No answer|retry Friday"

  # Preview as HTML without writing a PDF
  mentor-report preview --type issue-raised ... --entries-file entries.json --format html

  # Show the normalized rows of a file
  mentor-report rows --file class.csv --json

  # List report types and metadata values
  mentor-report options

ENTRIES FILE:
  A JSON array of {"studentName", "rollNumber", "details", "remarks"} objects.
  Remarks are kept with the entry but never printed in the report.

ENVIRONMENT VARIABLES:
  MENTOR_REPORT_*         Every form flag has a matching variable, e.g.
                          MENTOR_REPORT_BATCH, MENTOR_REPORT_OUTPUT_DIR
  MENTOR_REPORT_PROFILE   Path of the profile file used by login/whoami
  PDFIUM_LIB_PATH         libpdfium file, or the directory holding it
  RUST_LOG                Overrides -v / -q log filtering
"#;

/// Generate mentoring reports from spreadsheets or typed student entries.
#[derive(Parser, Debug)]
#[command(
    name = "mentor-report",
    version,
    about = "Generate mentoring reports (preview or PDF) from spreadsheets or typed entries",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MENTOR_REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MENTOR_REPORT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the report and write it as a PDF.
    Generate {
        #[command(flatten)]
        form: FormArgs,

        /// Directory the PDF is written to.
        #[arg(short, long, env = "MENTOR_REPORT_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Print the export result as JSON.
        #[arg(long, env = "MENTOR_REPORT_JSON")]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "MENTOR_REPORT_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Print the on-screen preview.
    Preview {
        #[command(flatten)]
        form: FormArgs,

        /// Preview format.
        #[arg(long, value_enum, default_value = "text")]
        format: PreviewFormat,

        /// Write the preview to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the normalized rows of a file or of typed entries.
    Rows {
        #[command(flatten)]
        source: SourceArgs,

        /// Print rows and warnings as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List report types and the metadata catalogue.
    Options {
        #[arg(long)]
        json: bool,
    },

    /// Store the display name (and email) shown by the dashboard.
    Login {
        /// Display name.
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored profile.
    Logout,

    /// Show the stored profile.
    Whoami {
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PreviewFormat {
    Text,
    Html,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InputArg {
    File,
    Manual,
}

impl From<InputArg> for InputMethod {
    fn from(v: InputArg) -> Self {
        match v {
            InputArg::File => InputMethod::File,
            InputArg::Manual => InputMethod::Manual,
        }
    }
}

/// Where rows come from.
#[derive(Args, Debug)]
struct SourceArgs {
    /// CSV, XLSX or XLS file.
    #[arg(short, long, env = "MENTOR_REPORT_FILE")]
    file: Option<PathBuf>,

    /// Declared MIME type of --file (normally inferred from the extension).
    #[arg(long, env = "MENTOR_REPORT_MIME")]
    mime: Option<String>,

    /// A typed entry: "NAME|ROLL[|DETAILS[|REMARKS]]". Repeatable.
    #[arg(short, long = "entry")]
    entries: Vec<String>,

    /// JSON file with an array of entries.
    #[arg(long, env = "MENTOR_REPORT_ENTRIES_FILE")]
    entries_file: Option<PathBuf>,

    /// Which source feeds the report. Default: file when --file is given.
    #[arg(long, value_enum, env = "MENTOR_REPORT_INPUT")]
    input: Option<InputArg>,
}

/// The whole form: type, metadata, rows and layout overrides.
#[derive(Args, Debug)]
struct FormArgs {
    /// Report type slug (see `mentor-report options`).
    #[arg(short = 't', long = "type", env = "MENTOR_REPORT_TYPE")]
    report_type: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_PROGRAM")]
    program: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_BATCH")]
    batch: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_ACADEMIC_YEAR")]
    academic_year: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_GROUP")]
    group: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_SESSION")]
    session: Option<String>,

    #[arg(long, env = "MENTOR_REPORT_SEMESTER")]
    semester: Option<String>,

    #[command(flatten)]
    source: SourceArgs,

    /// JSON config file (department, institution, pdf layout, output dir).
    #[arg(long, env = "MENTOR_REPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Department line override.
    #[arg(long, env = "MENTOR_REPORT_DEPARTMENT")]
    department: Option<String>,

    /// Institution line override.
    #[arg(long, env = "MENTOR_REPORT_INSTITUTION")]
    institution: Option<String>,

    /// Table body font size in points (6–16).
    #[arg(long, env = "MENTOR_REPORT_FONT_SIZE")]
    font_size: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            form,
            output_dir,
            json,
            no_progress,
        } => generate(form, output_dir, json, !cli.quiet && !no_progress && !json, cli.quiet).await,
        Command::Preview {
            form,
            format,
            output,
        } => preview(form, format, output, cli.quiet).await,
        Command::Rows { source, json } => rows(source, json, cli.quiet).await,
        Command::Options { json } => options(json),
        Command::Login { name, email } => {
            let store = ProfileStore::default_location();
            let profile = store
                .login(&name, email.as_deref())
                .context("Failed to store profile")?;
            if !cli.quiet {
                eprintln!(
                    "{} Welcome, {}  {}",
                    green("✔"),
                    bold(&profile.display_name),
                    dim(&store.path().display().to_string())
                );
            }
            Ok(())
        }
        Command::Logout => {
            let removed = ProfileStore::default_location()
                .logout()
                .context("Failed to remove profile")?;
            if !cli.quiet {
                eprintln!(
                    "{} {}",
                    green("✔"),
                    if removed { "Logged out" } else { "Nobody was logged in" }
                );
            }
            Ok(())
        }
        Command::Whoami { json } => {
            let profile = ProfileStore::default_location()
                .load()
                .context("Failed to read profile")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&profile).context("Failed to serialise profile")?
                );
            } else {
                println!("{}", describe_profile(&profile));
            }
            Ok(())
        }
    }
}

fn describe_profile(profile: &Profile) -> String {
    match &profile.email {
        Some(email) => format!("{} <{}>", profile.display_name, email),
        None => profile.display_name.clone(),
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

async fn generate(
    form: FormArgs,
    output_dir: Option<PathBuf>,
    json: bool,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = build_config(&form)?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    if !quiet && !json {
        let profile = ProfileStore::default_location().load().unwrap_or_default();
        eprintln!("{} {}", cyan("◆"), dim(&format!("Signed in as {}", describe_profile(&profile))));
    }

    let session = build_session(&form, config, sink_for(json, quiet)).await?;

    let bar = show_progress.then(|| spinner("Exporting", "Rendering PDF…"));
    let result = tokio::task::block_in_place(|| -> Result<_, mentoring_report::ReportError> {
        let engine = PdfEngine::bind()?;
        session.export_pdf(&engine)
    });
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let out = result.context("PDF export failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {} rows  {}ms  →  {}",
            green("✔"),
            out.rows,
            out.duration_ms,
            bold(&out.path.display().to_string()),
        );
    }
    Ok(())
}

async fn preview(
    form: FormArgs,
    format: PreviewFormat,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let config = build_config(&form)?;
    let session = build_session(&form, config, sink_for(false, quiet)).await?;
    let preview = session.preview().context("Report is not ready to preview")?;

    let rendered = match format {
        PreviewFormat::Text => render_text(&preview),
        PreviewFormat::Html => render_html(&preview),
    };

    match output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("Failed to write preview to {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

async fn rows(source: SourceArgs, json: bool, quiet: bool) -> Result<()> {
    let mut session = Session::builder().sink(sink_for(json, quiet)).build();
    load_rows(&mut session, &source).await?;

    let rows = session.current_rows();
    let warnings = session
        .uploaded()
        .filter(|_| session.input_method() == InputMethod::File)
        .map(|u| u.warnings.clone())
        .unwrap_or_default();

    if json {
        let value = serde_json::json!({ "rows": rows, "warnings": warnings });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise rows")?
        );
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in &rows {
        let [seq, name, roll, details] = row.cells();
        writeln!(out, "{seq:>4}  {name:<24}  {roll:<12}  {details}")
            .context("Failed to write to stdout")?;
    }
    if !quiet {
        for w in &warnings {
            eprintln!("{} {}", yellow("⚠"), w);
        }
        eprintln!("{}", dim(&format!("{} row(s)", rows.len())));
    }
    Ok(())
}

fn options(json: bool) -> Result<()> {
    if json {
        let types: Vec<_> = ReportType::ALL
            .iter()
            .map(|t| {
                serde_json::json!({
                    "value": t.slug(),
                    "label": t.label(),
                    "detailsLabel": t.details_label(),
                })
            })
            .collect();
        let fields: serde_json::Map<String, serde_json::Value> = MetadataField::ALL
            .iter()
            .map(|f| {
                let opts: Vec<_> = f
                    .options()
                    .iter()
                    .map(|(v, l)| serde_json::json!({ "value": v, "label": l }))
                    .collect();
                (f.key().to_string(), serde_json::Value::Array(opts))
            })
            .collect();
        let value = serde_json::json!({ "reportTypes": types, "metadata": fields });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise options")?
        );
        return Ok(());
    }

    println!("{}", bold("REPORT TYPES"));
    for t in ReportType::ALL {
        println!("  {:<24} {}", cyan(t.slug()), t.label());
    }
    for f in MetadataField::ALL {
        println!("\n{} {}", bold(&f.label().to_uppercase()), dim(&format!("(--{})", flag_name(f))));
        for (value, label) in f.options() {
            println!("  {:<24} {}", cyan(value), label);
        }
    }
    Ok(())
}

fn flag_name(field: MetadataField) -> &'static str {
    match field {
        MetadataField::Program => "program",
        MetadataField::Batch => "batch",
        MetadataField::AcademicYear => "academic-year",
        MetadataField::Group => "group",
        MetadataField::Session => "session",
        MetadataField::Semester => "semester",
    }
}

// ── Form plumbing ────────────────────────────────────────────────────────────

fn sink_for(json: bool, quiet: bool) -> SharedSink {
    if json || quiet {
        Arc::new(TracingSink)
    } else {
        Arc::new(TerminalSink)
    }
}

/// Map CLI args onto `ReportConfig`.
fn build_config(form: &FormArgs) -> Result<ReportConfig> {
    let mut config = match &form.config {
        Some(path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(ref d) = form.department {
        config.department = d.clone();
    }
    if let Some(ref i) = form.institution {
        config.institution = i.clone();
    }
    if let Some(size) = form.font_size {
        config.pdf.body_font_size = size.clamp(6.0, 16.0);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn form_metadata(form: &FormArgs) -> AcademicMetadata {
    let mut metadata = AcademicMetadata::default();
    let values = [
        (MetadataField::Program, &form.program),
        (MetadataField::Batch, &form.batch),
        (MetadataField::AcademicYear, &form.academic_year),
        (MetadataField::Group, &form.group),
        (MetadataField::Session, &form.session),
        (MetadataField::Semester, &form.semester),
    ];
    for (field, value) in values {
        if let Some(value) = value {
            if !field.is_known_value(value.trim()) {
                warn!("'{}' is not a listed {} option", value, field.label());
            }
            metadata.set(field, value.trim());
        }
    }
    metadata
}

async fn build_session(form: &FormArgs, config: ReportConfig, sink: SharedSink) -> Result<Session> {
    let mut session = Session::builder().config(config).sink(sink).build();
    if let Some(ref slug) = form.report_type {
        let report_type: ReportType = slug.parse().context("Invalid --type")?;
        session.select_report_type(report_type);
    }
    session.set_metadata(form_metadata(form));
    load_rows(&mut session, &form.source).await?;
    Ok(session)
}

fn parse_entry(raw: &str) -> ManualEntry {
    let mut parts = raw.splitn(4, '|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let roll = parts.next().unwrap_or_default();
    let mut entry = ManualEntry::new(name, roll);
    if let Some(details) = parts.next() {
        entry = entry.details(details);
    }
    if let Some(remarks) = parts.next() {
        entry = entry.remarks(remarks);
    }
    entry
}

async fn load_rows(session: &mut Session, source: &SourceArgs) -> Result<()> {
    let method = source.input.map(InputMethod::from).unwrap_or(if source.file.is_some() {
        InputMethod::File
    } else {
        InputMethod::Manual
    });
    session.set_input_method(method);

    if let Some(ref path) = source.file {
        session
            .attach_file(path, source.mime.as_deref())
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    let mut entries = Vec::new();
    if let Some(ref path) = source.entries_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read entries from {}", path.display()))?;
        let from_file: Vec<ManualEntry> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of entries", path.display()))?;
        entries.extend(from_file);
    }
    for raw in &source.entries {
        entries.push(parse_entry(raw));
    }

    for (i, entry) in entries.into_iter().enumerate() {
        if let Err(e) = session.add_manual_entry(entry) {
            bail!("Entry {} rejected: {}", i + 1, e);
        }
    }
    Ok(())
}
