//! jsref CLI
//!
//! Command-line interface for expanding JSON References.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use jsref::{FilesystemProvider, ResolveError, Resolver, Url, DEFAULT_MAX_RECURSIONS};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsref")]
#[command(about = "Resolve JSON Reference ($ref) pointers in JSON documents")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a document and expand every $ref in it
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        /// Maximum nesting of reference expansion
        #[arg(long, default_value_t = DEFAULT_MAX_RECURSIONS)]
        max_recursions: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch a document (or the part a #fragment selects) without expanding it
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the fetched bytes as-is instead of re-serialized JSON
        #[arg(long, conflicts_with = "pretty")]
        raw: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Document source: file path or URL (file://, http://, https://), with optional #fragment
    source: String,

    /// Directory file locators are served from; paths in SOURCE are relative to it
    #[arg(long)]
    root: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Never issue HTTP requests; only read local files
    #[arg(long)]
    offline: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Report errors as JSON on stdout (for automation)
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            source,
            max_recursions,
            output,
        } => run_resolve(&source, max_recursions, &output),
        Commands::Fetch {
            source,
            raw,
            output,
        } => run_fetch(&source, raw, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jsref={}", level)));
    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_resolve(source: &SourceArgs, max_recursions: usize, output: &OutputArgs) -> Result<(), u8> {
    let (locator, resolver) = prepare(source, output.json)?;
    let resolver = resolver.max_recursions(max_recursions);
    info!(%locator, providers = ?resolver.provider_names(), "resolving");

    let resolved = resolver
        .resolve_locator(locator.as_str())
        .map_err(|e| report_resolve_error(output.json, &e))?;
    write_json(&resolved, output)
}

fn run_fetch(source: &SourceArgs, raw: bool, output: &OutputArgs) -> Result<(), u8> {
    let (locator, resolver) = prepare(source, output.json)?;
    info!(%locator, providers = ?resolver.provider_names(), "fetching");

    if raw {
        let bytes = resolver
            .fetch_bytes(locator.as_str())
            .map_err(|e| report_resolve_error(output.json, &e))?;
        return write_bytes(&bytes, output.output.as_deref());
    }

    let document = resolver
        .fetch(locator.as_str())
        .map_err(|e| report_resolve_error(output.json, &e))?;
    write_json(&document, output)
}

/// Turn the source argument into a locator and build the provider chain.
fn prepare(source: &SourceArgs, json_output: bool) -> Result<(Url, Resolver), u8> {
    let (locator, fs_root) = source_locator(&source.source, source.root.as_deref())
        .map_err(|msg| {
            report_error(json_output, &msg, None);
            2u8
        })?;
    debug!(%locator, root = %fs_root.display(), "source mapped");

    let resolver = build_resolver(source, fs_root).map_err(|msg| {
        report_error(json_output, &msg, None);
        2u8
    })?;
    Ok((locator, resolver))
}

/// Map SOURCE to a locator plus the filesystem root it must be read from.
///
/// URLs are used as given. Paths become `file` locators: relative to
/// `--root` when given, otherwise made absolute and served from `/`.
fn source_locator(source: &str, root: Option<&Path>) -> Result<(Url, PathBuf), String> {
    let fs_root = root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    // Single-letter schemes are Windows drive letters, not URLs.
    if let Ok(url) = Url::parse(source) {
        if url.scheme().len() > 1 {
            return Ok((url, fs_root));
        }
    }

    let (path_part, fragment) = match source.find('#') {
        Some(idx) => (&source[..idx], Some(&source[idx + 1..])),
        None => (source, None),
    };

    let absolute = if root.is_some() {
        Path::new("/").join(path_part)
    } else if Path::new(path_part).is_absolute() {
        PathBuf::from(path_part)
    } else {
        std::env::current_dir()
            .map_err(|e| format!("cannot determine current directory: {}", e))?
            .join(path_part)
    };

    let mut url = Url::from_file_path(&absolute)
        .map_err(|()| format!("cannot turn {} into a file locator", absolute.display()))?;
    url.set_fragment(fragment);
    Ok((url, fs_root))
}

fn build_resolver(source: &SourceArgs, fs_root: PathBuf) -> Result<Resolver, String> {
    let resolver = Resolver::new().with_provider(FilesystemProvider::new(fs_root));
    if source.offline {
        return Ok(resolver);
    }
    with_http(resolver, source.timeout)
}

#[cfg(feature = "remote")]
fn with_http(resolver: Resolver, timeout_secs: u64) -> Result<Resolver, String> {
    let http = jsref::HttpProvider::with_timeout(std::time::Duration::from_secs(timeout_secs))
        .map_err(|e| e.to_string())?;
    Ok(resolver.with_provider(http))
}

#[cfg(not(feature = "remote"))]
fn with_http(resolver: Resolver, _timeout_secs: u64) -> Result<Resolver, String> {
    Ok(resolver)
}

fn write_json(value: &Value, output: &OutputArgs) -> Result<(), u8> {
    let rendered = if output.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    let mut bytes = rendered.into_bytes();
    bytes.push(b'\n');
    write_bytes(&bytes, output.output.as_deref())
}

fn write_bytes(bytes: &[u8], output: Option<&Path>) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(path, bytes).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => std::io::stdout().write_all(bytes).map_err(|e| {
            eprintln!("Error writing output: {}", e);
            3u8
        }),
    }
}

fn report_resolve_error(json_output: bool, err: &ResolveError) -> u8 {
    report_error(json_output, &err.to_string(), Some(err));
    err.exit_code() as u8
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str, err: Option<&ResolveError>) {
    if json_output {
        let output = serde_json::json!({
            "error": msg,
            "kind": err.map(ResolveError::kind),
        });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}
