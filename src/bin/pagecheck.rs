//! CLI binary for pagecheck.
//!
//! A thin shim over the library crate: flags map to `ClientConfig` /
//! `ViewerConfig`, results are printed for humans or as JSON.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pagecheck::config::DEFAULT_BASE_URL;
use pagecheck::viewer::{encode_png, HeadlessEngine, PageView, PdfiumEngine, RenderEngine};
use pagecheck::{
    ApiClient, ApiError, ApiResponse, BackendApi, ClientConfig, DocumentCatalog, PageFraming,
    PromptRequest, PromptType, QueryValue, Tone, ViewerConfig, ViewerController, ViewerObserver,
    ViewerSnapshot,
};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

// ── Terminal observer ────────────────────────────────────────────────────────

/// Spinner while a page loads, one log line per result.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Viewer");
        bar.set_message("Connecting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ViewerObserver for CliObserver {
    fn on_mount(&self, document_id: &str) {
        self.bar.set_message(format!("opening document {document_id}"));
    }

    fn on_page_loading(&self, page: u32, total: Option<u32>) {
        let total = total.map(|t| t.to_string()).unwrap_or_else(|| "?".into());
        self.bar.set_prefix("Loading");
        self.bar.set_message(format!("page {page} of {total}"));
    }

    fn on_page_ready(&self, page: u32, _uri: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page,
            dim(&format!("{bytes:>7} bytes")),
        ));
    }

    fn on_page_unavailable(&self, page: u32, reason: &str) {
        self.bar
            .println(format!("  {} Page {:>3}  {}", red("✗"), page, red(reason)));
    }

    fn on_page_failed(&self, page: u32, error: &ApiError) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            red("✗"),
            page,
            red(&error.message),
            dim(&format!("status {}", error.status)),
        ));
    }

    fn on_total_pages(&self, total: u32) {
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&format!("{total} pages"))));
    }

    fn on_checks_loaded(&self, categories: usize, checks: usize) {
        self.bar.println(format!(
            "{} {} checks in {} categories",
            cyan("◆"),
            bold(&checks.to_string()),
            categories
        ));
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Documents known to the viewer
  pagecheck list

  # Checks for document 1, grouped by category
  pagecheck checks 1

  # Open document 1 on page 3 and save the page payload
  pagecheck view 1 --page 3 --save-pdf page3.pdf

  # Jump to the page of the second check in the first tab, render it
  pagecheck view 1 --tab 0 --check 1 --render-png check.png

  # Raw calls through the HTTP client
  pagecheck request get /api/total-pages
  pagecheck request post /api/extract-page --data '{"page_number": 2}'

  # Writing prompt
  pagecheck prompt "a city that never sleeps" --type marketing --tone casual --tag neon

ENVIRONMENT VARIABLES:
  PAGECHECK_PUBLIC_URL    Backend base URL (default http://127.0.0.1:8000)
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  RUST_LOG                Log filter, overrides --verbose / --quiet
"#;

/// Browse documents, their pages and their checks.
#[derive(Parser, Debug)]
#[command(
    name = "pagecheck",
    version,
    about = "Browse analysed documents, their pages and their checks",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "PAGECHECK_PUBLIC_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Extra header sent with every request, as `Name: value`.
    #[arg(short = 'H', long = "header", global = true, value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Output JSON instead of text.
    #[arg(long, global = true, env = "PAGECHECK_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAGECHECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAGECHECK_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the documents in the catalog.
    List,
    /// Fetch the checks of a document.
    Checks {
        /// Catalog id, e.g. 1.
        document_id: String,
    },
    /// Open a document in the viewer and report what it shows.
    View(ViewArgs),
    /// Build a writing prompt from a sentence.
    Prompt(PromptArgs),
    /// Issue one request through the HTTP client.
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Catalog id, e.g. 1.
    document_id: String,

    /// Page to show after the document opens.
    #[arg(long, default_value_t = 1)]
    page: i64,

    /// Checks tab to select.
    #[arg(long)]
    tab: Option<usize>,

    /// Jump to the page of this check (index within the selected tab).
    #[arg(long)]
    check: Option<usize>,

    /// Write the displayed page's PDF bytes here.
    #[arg(long)]
    save_pdf: Option<PathBuf>,

    /// Rasterise the displayed page to this PNG file.
    #[arg(long)]
    render_png: Option<PathBuf>,

    /// Render width in pixels (100–4000).
    #[arg(long, default_value_t = 500)]
    width: u32,

    /// How page payloads map to pages.
    #[arg(long, value_enum, default_value = "single")]
    framing: FramingArg,

    /// Skip the pdfium engine; pages are fetched but not rendered.
    #[arg(long)]
    headless: bool,

    /// Disable the spinner.
    #[arg(long, env = "PAGECHECK_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct PromptArgs {
    /// The sentence to build on.
    sentence: String,

    #[arg(long = "type", value_enum, default_value = "creative")]
    prompt_type: PromptTypeArg,

    #[arg(long, value_enum, default_value = "neutral")]
    tone: ToneArg,

    /// 1 (brief) to 10 (highly detailed).
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
    detail: u8,

    /// Topic to weave in; repeatable.
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Args, Debug)]
struct RequestArgs {
    #[arg(value_enum)]
    method: MethodArg,

    /// Endpoint path, e.g. /api/total-pages.
    endpoint: String,

    /// JSON body for post / put.
    #[arg(short, long)]
    data: Option<String>,

    /// Query parameter `key=value` for get; repeatable.
    #[arg(long = "query", value_parser = parse_key_val)]
    query: Vec<(String, String)>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FramingArg {
    Single,
    Full,
}

impl From<FramingArg> for PageFraming {
    fn from(v: FramingArg) -> Self {
        match v {
            FramingArg::Single => PageFraming::SinglePage,
            FramingArg::Full => PageFraming::FullDocument,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PromptTypeArg {
    Creative,
    Technical,
    Marketing,
    Academic,
}

impl From<PromptTypeArg> for PromptType {
    fn from(v: PromptTypeArg) -> Self {
        match v {
            PromptTypeArg::Creative => PromptType::Creative,
            PromptTypeArg::Technical => PromptType::Technical,
            PromptTypeArg::Marketing => PromptType::Marketing,
            PromptTypeArg::Academic => PromptType::Academic,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ToneArg {
    Neutral,
    Enthusiastic,
    Formal,
    Casual,
}

impl From<ToneArg> for Tone {
    fn from(v: ToneArg) -> Self {
        match v {
            ToneArg::Neutral => Tone::Neutral,
            ToneArg::Enthusiastic => Tone::Enthusiastic,
            ToneArg::Formal => Tone::Formal,
            ToneArg::Casual => Tone::Casual,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    Get,
    Post,
    Put,
    Delete,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got '{s}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `key=value`, got '{s}'"))?;
    Ok((k.to_string(), v.to_string()))
}

/// Integers and booleans go out as such; everything else as a string.
fn query_value(raw: &str) -> QueryValue {
    if let Ok(i) = raw.parse::<i64>() {
        QueryValue::Int(i)
    } else if let Ok(b) = raw.parse::<bool>() {
        QueryValue::Bool(b)
    } else {
        QueryValue::Str(raw.to_string())
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The spinner gives the feedback that matters; keep library logs to
    // errors while it runs.
    let spinner = matches!(&cli.command, Command::View(v) if !v.no_progress) && !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
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

    let mut builder = ClientConfig::builder().base_url(&cli.base_url);
    for (name, value) in &cli.headers {
        builder = builder.header(name, value);
    }
    let client_config = builder.build().context("Invalid client configuration")?;

    match &cli.command {
        Command::List => list(&cli),
        Command::Checks { document_id } => checks(&cli, &client_config, document_id).await,
        Command::View(args) => view(&cli, &client_config, args, spinner).await,
        Command::Prompt(args) => prompt(&cli, args),
        Command::Request(args) => request(&cli, &client_config, args).await,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialise output")?
    );
    Ok(())
}

fn list(cli: &Cli) -> Result<()> {
    let catalog = DocumentCatalog::builtin();
    if cli.json {
        return print_json(&catalog.iter().collect::<Vec<_>>());
    }
    println!("{:<4} {:<16} {:<10} {}", bold("ID"), bold("Name"), bold("Status"), bold("Updated"));
    for doc in catalog.iter() {
        println!(
            "{:<4} {:<16} {:<10} {}",
            doc.id,
            doc.name,
            doc.status.to_string(),
            doc.last_updated.format("%Y-%m-%d")
        );
    }
    Ok(())
}

async fn checks(cli: &Cli, config: &ClientConfig, document_id: &str) -> Result<()> {
    let catalog = DocumentCatalog::builtin();
    let doc = catalog
        .find(document_id)
        .ok_or_else(|| anyhow!("Document '{document_id}' not found"))?;

    let api = BackendApi::new(ApiClient::from_config(config).context("Failed to build HTTP client")?);
    let bundle = api
        .checks(doc.backend_key())
        .await
        .with_context(|| format!("Failed to fetch checks for '{}'", doc.name))?;

    if cli.json {
        return print_json(&bundle);
    }
    for (category, list) in bundle.iter() {
        println!("{}", bold(category));
        for check in list {
            print_check(check);
        }
    }
    if !cli.quiet {
        eprintln!(
            "{} checks, {} failed",
            bundle.total_checks(),
            bundle.failed_checks()
        );
    }
    Ok(())
}

fn print_check(check: &pagecheck::Check) {
    let mark = if check.passed() { green("✓") } else { red("✗") };
    println!(
        "  {} {}  {}  {}",
        mark,
        check.text,
        dim(&format!("page {}", check.page_number)),
        check.details
    );
}

async fn view(cli: &Cli, config: &ClientConfig, args: &ViewArgs, spinner: bool) -> Result<()> {
    let catalog = DocumentCatalog::builtin();
    if args.render_png.is_some() && args.headless {
        bail!("--render-png needs the pdfium engine; drop --headless");
    }

    let api = Arc::new(BackendApi::new(
        ApiClient::from_config(config).context("Failed to build HTTP client")?,
    ));
    let engine: Arc<dyn RenderEngine> = if args.headless {
        Arc::new(HeadlessEngine)
    } else {
        Arc::new(PdfiumEngine::new())
    };
    let viewer_config = ViewerConfig::builder()
        .page_framing(args.framing.into())
        .render_width(args.width)
        .build()
        .context("Invalid viewer configuration")?;

    let mut viewer = ViewerController::new(api, engine, viewer_config);
    let observer = spinner.then(CliObserver::new);
    if let Some(obs) = &observer {
        viewer = viewer.with_observer(Arc::clone(obs) as Arc<dyn ViewerObserver>);
    }

    viewer.mount(&args.document_id, &catalog);
    viewer.settle().await;
    if viewer.engine_failed() {
        bail!("Rendering engine failed to start; no page can be loaded");
    }

    if args.page != 1 {
        viewer
            .navigate(args.page)
            .with_context(|| format!("Cannot open page {}", args.page))?;
    }
    if let Some(tab) = args.tab {
        viewer.select_tab(tab).context("Cannot select tab")?;
    }
    if let Some(check) = args.check {
        viewer.select_check(check).context("Cannot select check")?;
    }
    viewer.settle().await;

    if let Some(obs) = &observer {
        obs.finish();
    }

    if let Some(path) = &args.save_pdf {
        let handle = viewer
            .current_handle()
            .ok_or_else(|| anyhow!("No page is displayed; nothing to save"))?;
        tokio::fs::write(path, handle.bytes().as_ref())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if let Some(path) = &args.render_png {
        let image = viewer
            .render_current()
            .await
            .context("Failed to render the displayed page")?;
        let png = encode_png(&image)?;
        tokio::fs::write(path, png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{}x{}", image.width(), image.height()))
            );
        }
    }

    let snapshot = viewer.snapshot();
    viewer.unmount();

    if cli.json {
        return print_json(&snapshot);
    }
    print_snapshot(&catalog, &snapshot);
    Ok(())
}

fn print_snapshot(catalog: &DocumentCatalog, snap: &ViewerSnapshot) {
    if let Some(doc) = snap.document_id.as_deref().and_then(|id| catalog.find(id)) {
        println!("{}  {}", bold(&doc.name), dim(&doc.status.to_string()));
    }
    println!("{}", snap.page_label);
    match &snap.page {
        PageView::Ready { uri, bytes, .. } => {
            println!("  {} {}", dim(uri), dim(&format!("({bytes} bytes)")))
        }
        PageView::Unavailable { reason, .. } => println!("  {}", red(reason)),
        PageView::Empty => println!("  {}", dim("nothing loaded")),
    }
    if let Some(pages) = snap.engine_pages {
        println!("  {}", dim(&format!("payload has {pages} page(s)")));
    }

    if snap.categories.is_empty() {
        return;
    }
    let tabs: Vec<String> = snap
        .categories
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == snap.selected_tab {
                bold(&format!("[{name}]"))
            } else {
                name.clone()
            }
        })
        .collect();
    println!("{}", tabs.join("  "));
    for check in &snap.visible_checks {
        print_check(check);
    }
}

fn prompt(cli: &Cli, args: &PromptArgs) -> Result<()> {
    let mut request = PromptRequest::new(args.sentence.as_str())
        .prompt_type(args.prompt_type.into())
        .tone(args.tone.into())
        .detail(args.detail);
    for tag in &args.tags {
        request.add_tag(tag.as_str());
    }

    let text = request
        .generate()
        .ok_or_else(|| anyhow!("Enter a sentence to build a prompt from"))?;

    if cli.json {
        return print_json(&serde_json::json!({
            "prompt": text,
            "type": request.prompt_type,
            "tone": request.tone,
            "detail": request.detail,
            "tags": request.tags,
        }));
    }
    println!("{text}");
    Ok(())
}

async fn request(cli: &Cli, config: &ClientConfig, args: &RequestArgs) -> Result<()> {
    let client = ApiClient::from_config(config).context("Failed to build HTTP client")?;

    let body: Value = match &args.data {
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON")?,
        None => Value::Object(Default::default()),
    };

    let result = match args.method {
        MethodArg::Get => {
            let query: Vec<(&str, QueryValue)> = args
                .query
                .iter()
                .map(|(k, v)| (k.as_str(), query_value(v)))
                .collect();
            client.get::<Value>(&args.endpoint, &query).await
        }
        MethodArg::Post => client.post::<Value, _>(&args.endpoint, &body).await,
        MethodArg::Put => client.put::<Value, _>(&args.endpoint, &body).await,
        MethodArg::Delete => client.delete::<Value>(&args.endpoint).await,
    };

    match result {
        Ok(ApiResponse::Content(value)) => print_json(&value),
        Ok(ApiResponse::NoContent { status }) => {
            if !cli.quiet {
                eprintln!("{} no content ({status})", green("✔"));
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                print_json(&serde_json::json!({
                    "message": e.message,
                    "status": e.status,
                    "payload": e.payload,
                }))?;
            }
            Err(anyhow::Error::new(e).context(format!("{:?} {} failed", args.method, args.endpoint)))
        }
    }
}
