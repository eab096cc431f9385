//! CLI binary for pdf-qa-client.
//!
//! A thin shim over the library crate: uploads one PDF, asks the questions
//! given on the command line (or read from stdin), prints answers as they
//! stream, and optionally exports the transcript.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_qa_client::{
    format_file_size, render_markdown, ClientConfig, NotificationLevel, PdfQaError, Session,
    SessionObserver, Transcript, UploadReceipt, DEFAULT_BASE_URL,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Terminal observer: a spinner while the server works, answer text echoed to
/// stdout as it arrives, notifications on stderr.
struct CliObserver {
    /// Spinner shown during upload and until the first answer chunk.
    spinner: Mutex<Option<ProgressBar>>,
    show_progress: bool,
    /// Echo answer deltas to stdout.
    echo: bool,
    quiet: bool,
}

impl CliObserver {
    fn new(show_progress: bool, echo: bool, quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            show_progress,
            echo,
            quiet,
        })
    }

    fn start_spinner(&self, prefix: &str, msg: String) {
        if !self.show_progress {
            return;
        }
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());
        bar.set_message(msg);
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Some(old) = self.spinner.lock().unwrap().replace(bar) {
            old.finish_and_clear();
        }
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl SessionObserver for CliObserver {
    fn on_upload_start(&self, name: &str, size: u64) {
        self.start_spinner(
            "Uploading",
            format!("{name} ({}) … embedding can take a while", format_file_size(size)),
        );
    }

    fn on_upload_complete(&self, receipt: &UploadReceipt) {
        self.stop_spinner();
        if !self.quiet {
            let chunks = receipt
                .chunks
                .map(|n| format!("{n} chunks"))
                .unwrap_or_else(|| "processed".to_string());
            eprintln!("{} {}  {}", green("✔"), bold(&receipt.path), dim(&chunks));
        }
    }

    fn on_pending(&self) {
        self.start_spinner("Thinking", "✨ Generating answer…".to_string());
    }

    fn on_first_chunk(&self) {
        self.stop_spinner();
    }

    fn on_chunk(&self, delta: &str, _live_text: &str) {
        if self.echo {
            let mut out = io::stdout().lock();
            let _ = out.write_all(delta.as_bytes());
            let _ = out.flush();
        }
    }

    fn on_answer_finalized(&self, _html: &str) {
        if self.echo {
            println!();
        }
    }

    fn on_answer_error(&self, message: &str) {
        self.stop_spinner();
        if self.echo {
            println!();
        }
        eprintln!("{} {}", red("✘"), red(message));
    }

    fn on_notification(&self, level: NotificationLevel, message: &str) {
        if self.quiet {
            return;
        }
        match level {
            NotificationLevel::Info => eprintln!("{} {}", cyan("◆"), message),
            NotificationLevel::Error => eprintln!("{} {}", red("✘"), message),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload and ask one question
  pdfqa paper.pdf -q "What is the main contribution?"

  # Several questions, transcript saved as HTML
  pdfqa paper.pdf -q "Summarise section 2" -q "List the datasets" --html chat.html

  # Interactive: one question per line on stdin
  pdfqa paper.pdf

  # Questions from a file, transcript as JSON
  pdfqa paper.pdf --json < questions.txt > transcript.json

  # Render a markdown answer to HTML (no server needed)
  pdfqa --render-only answer.md

ENVIRONMENT VARIABLES:
  PDFQA_SERVER   Base URL of the QA service (default http://127.0.0.1:8000)
  RUST_LOG       Override log filter (e.g. pdf_qa_client=debug)
"#;

/// Ask questions about a PDF through a streaming QA service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfqa",
    version,
    about = "Ask questions about a PDF through a streaming QA service",
    long_about = "Upload a PDF to a retrieval-augmented question-answering service, then ask \
questions about it. Answers are printed as they stream and rendered to HTML once complete.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF to upload (markdown file with --render-only).
    input: PathBuf,

    /// Base URL of the QA service.
    #[arg(short, long, env = "PDFQA_SERVER", default_value = DEFAULT_BASE_URL)]
    server: String,

    /// Question to ask; repeat for several. Reads stdin line by line when absent.
    #[arg(short = 'q', long = "question")]
    questions: Vec<String>,

    /// Write the transcript as an HTML page to this file.
    #[arg(long, env = "PDFQA_HTML")]
    html: Option<PathBuf>,

    /// Print the transcript as JSON instead of streaming answers.
    #[arg(long, env = "PDFQA_JSON")]
    json: bool,

    /// Render INPUT as markdown to HTML on stdout and exit.
    #[arg(long)]
    render_only: bool,

    /// TCP connect timeout in seconds.
    #[arg(long, env = "PDFQA_CONNECT_TIMEOUT", default_value_t = 30)]
    connect_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFQA_VERBOSE")]
    verbose: bool,

    /// Suppress progress and notifications; answers are still printed.
    #[arg(long, env = "PDFQA_QUIET")]
    quiet: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDFQA_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs would interleave with the spinner and the
    // streamed answer, so they are only shown when both are off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.render_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Render-only mode ─────────────────────────────────────────────────
    if cli.render_only {
        let text = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {:?}", cli.input))?;
        println!("{}", render_markdown(&text));
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(cli.server.as_str())
        .connect_timeout_secs(cli.connect_timeout)
        .no_welcome_message()
        .observer(CliObserver::new(show_progress, !cli.json, cli.quiet))
        .build()
        .context("Invalid configuration")?;

    let mut session = Session::new(config).context("Failed to create session")?;

    // ── Upload ───────────────────────────────────────────────────────────
    session
        .upload(&cli.input)
        .await
        .with_context(|| format!("Could not upload {:?}", cli.input))?;

    // ── Questions ────────────────────────────────────────────────────────
    let mut total = 0usize;
    let mut failed = 0usize;

    if cli.questions.is_empty() {
        let interactive = io::stdin().is_terminal();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if interactive {
                eprint!("{} ", bold(">"));
                let _ = io::stderr().flush();
            }
            let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            total += 1;
            if !ask_one(&mut session, &line, &cli).await {
                failed += 1;
            }
        }
    } else {
        for question in &cli.questions {
            total += 1;
            if !ask_one(&mut session, question, &cli).await {
                failed += 1;
            }
        }
    }

    // ── Export ───────────────────────────────────────────────────────────
    let transcript = session.into_transcript();

    if let Some(ref path) = cli.html {
        write_html(path, &transcript, &cli.input)?;
        if !cli.quiet {
            eprintln!("{} transcript  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if cli.json {
        let json =
            serde_json::to_string_pretty(&transcript).context("Failed to serialise transcript")?;
        println!("{json}");
    }

    if failed > 0 {
        anyhow::bail!("{failed}/{total} questions failed");
    }
    Ok(())
}

/// Ask one question; `false` when it failed. Errors are already reported by
/// the observer, so they are not propagated.
async fn ask_one(session: &mut Session, question: &str, cli: &Cli) -> bool {
    if !cli.json && !cli.quiet && !io::stdin().is_terminal() {
        eprintln!("{} {}", cyan("?"), bold(question.trim()));
    }
    match session.ask(question).await {
        Ok(stats) => {
            if !cli.quiet && !cli.json {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "   {} chunks  {} chars  {}ms",
                        stats.chunks, stats.answer_len, stats.duration_ms
                    ))
                );
            }
            true
        }
        Err(
            e @ (PdfQaError::EmptyQuestion
            | PdfQaError::NoDocument
            | PdfQaError::QuestionInFlight
            | PdfQaError::UploadInFlight),
        ) => {
            eprintln!("{} {}", red("✘"), e);
            false
        }
        Err(_) => false,
    }
}

/// Wrap the transcript view in a standalone HTML page.
fn write_html(path: &Path, transcript: &Transcript, input: &Path) -> Result<()> {
    let title = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "PDF".to_string());
    let page = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Chat about {}</title>\n</head>\n\
         <body style=\"font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; line-height: 1.6;\">\n\
         {}\n</body>\n</html>\n",
        pdf_qa_client::escape_html(&title),
        transcript.to_html()
    );
    std::fs::write(path, page).with_context(|| format!("Failed to write {:?}", path))
}
