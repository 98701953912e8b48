use clap::Parser;
use color_eyre::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use typeahead::config::{self, Config};
use typeahead::engine::{CachingMatchEngine, EngineState};
use typeahead::error::TypeaheadError;
use typeahead::remote::{MatchError, MatchSource, RemoteMatchSource};
use typeahead::search::{SearchEvent, TypeaheadSearch};
use typeahead::suggestion::RemoteSuggestion;
use typeahead::token::TokenSplitter;

/// How often the engine is ticked while waiting for the server
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Typeahead suggestions from a remote endpoint
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Typeahead suggestions from a remote endpoint, with local caching and fuzzy matching"
)]
struct Args {
    /// Suggestion endpoint (optional when set in the config file), followed by
    /// the tokens to match
    #[arg(value_name = "[URL] TOKENS", required = true)]
    inputs: Vec<String>,

    /// Number of suggestions shown per token
    #[arg(long)]
    max_matches: Option<usize>,

    /// Minimum time between server requests, in milliseconds
    #[arg(long)]
    throttle_ms: Option<u64>,

    /// Ask the server for prefix matches only
    #[arg(long)]
    no_similar: bool,

    /// Treat each token as a list of entries and match the last one
    #[arg(long)]
    multi: bool,

    /// Run a full-text search for each token instead
    #[arg(long)]
    search: bool,

    /// How long to wait for the server per token, in milliseconds
    #[arg(long, default_value_t = 2000)]
    wait_ms: u64,
}

fn main() -> Result<()> {
    // Writes to /tmp/typeahead-debug.log at DEBUG level
    #[cfg(debug_assertions)]
    init_debug_log();

    color_eyre::install()?;

    let config_result = config::load_config();
    if let Some(warning) = &config_result.warning {
        eprintln!("Warning: {}", warning);
    }

    let args = Args::parse();
    let (url, tokens) = split_inputs(args.inputs.clone());
    let config = apply_args(config_result.config, &args, url);

    let url = config
        .remote
        .url
        .clone()
        .ok_or_else(|| {
            TypeaheadError::MissingUrl(config::get_config_path().display().to_string())
        })?;

    let mut source = RemoteMatchSource::with_options(&url, config.remote.options())
        .map_err(TypeaheadError::from)?;
    for (key, value) in &config.remote.params {
        source.params_mut().set(key.as_str(), value.as_str());
    }
    source.set_headers(config.remote.headers.clone());
    source.set_error_logger(Box::new(|e: &MatchError| eprintln!("Warning: {}", e)));

    let engine = CachingMatchEngine::with_options(source, config.engine.options());
    let wait = Duration::from_millis(args.wait_ms);
    let splitter = TokenSplitter::new(config.remote.multi);

    if args.search {
        run_search(TypeaheadSearch::new(engine), &tokens, &splitter, wait)?;
    } else {
        run_matches(
            engine,
            &tokens,
            &splitter,
            config.engine.display_max_matches,
            wait,
        )?;
    }

    #[cfg(debug_assertions)]
    log::debug!("=== TYPEAHEAD DEBUG SESSION ENDED ===");

    Ok(())
}

#[cfg(debug_assertions)]
fn init_debug_log() {
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("/tmp/typeahead-debug.log")
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open /tmp/typeahead-debug.log: {}", e);
            return;
        }
    };

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format(|buf, record| {
            use std::time::SystemTime;
            let datetime: chrono::DateTime<chrono::Local> = SystemTime::now().into();
            writeln!(
                buf,
                "[{}] [{}] {}",
                datetime.format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("=== TYPEAHEAD DEBUG SESSION STARTED ===");
}

/// Split off a leading http(s) URL from the positional arguments
fn split_inputs(mut inputs: Vec<String>) -> (Option<String>, Vec<String>) {
    let is_url = inputs
        .first()
        .is_some_and(|first| first.starts_with("http://") || first.starts_with("https://"));
    if is_url {
        let url = inputs.remove(0);
        (Some(url), inputs)
    } else {
        (None, inputs)
    }
}

/// Command line flags override config file values
fn apply_args(mut config: Config, args: &Args, url: Option<String>) -> Config {
    if url.is_some() {
        config.remote.url = url;
    }
    if let Some(max_matches) = args.max_matches {
        config.engine.display_max_matches = max_matches;
    }
    if let Some(throttle_ms) = args.throttle_ms {
        config.engine.throttle_ms = throttle_ms;
    }
    if args.no_similar {
        config.remote.use_similar = false;
    }
    if args.multi {
        config.remote.multi = true;
    }
    config
}

fn run_matches(
    mut engine: CachingMatchEngine,
    tokens: &[String],
    splitter: &TokenSplitter,
    max_matches: usize,
    wait: Duration,
) -> Result<(), TypeaheadError> {
    let mut stdout = std::io::stdout().lock();

    for input in tokens {
        let token = splitter.current_token(input);
        engine.request_matches(token, max_matches, |token, matches, options| {
            log::debug!(
                "{} matches for '{}' (preserve highlight: {})",
                matches.len(),
                token,
                options.preserve_highlight
            );
        });

        let deadline = Instant::now() + wait;
        while engine.state() == EngineState::Fetching && Instant::now() < deadline {
            std::thread::sleep(TICK_INTERVAL);
            engine.tick();
        }

        writeln!(
            stdout,
            "{}",
            render_matches(input, engine.displayed(), engine.state())
        )?;
    }

    engine.dispose();
    Ok(())
}

fn run_search(
    mut search: TypeaheadSearch,
    tokens: &[String],
    splitter: &TokenSplitter,
    wait: Duration,
) -> Result<(), TypeaheadError> {
    let mut stdout = std::io::stdout().lock();

    for input in tokens {
        let token = splitter.current_token(input);
        if search.search(token).is_none() {
            writeln!(stdout, "{}\n  (skipped)", input)?;
            continue;
        }

        let deadline = Instant::now() + wait;
        let mut event = None;
        while event.is_none() && Instant::now() < deadline {
            std::thread::sleep(TICK_INTERVAL);
            event = search.tick();
        }

        writeln!(stdout, "{}", render_search(input, event.as_ref()))?;
    }

    search.engine_mut().dispose();
    Ok(())
}

/// Numbered suggestion list for one token
fn render_matches(input: &str, matches: &[Arc<RemoteSuggestion>], state: EngineState) -> String {
    let mut lines = vec![input.to_string()];
    if matches.is_empty() {
        lines.push(match state {
            EngineState::Fetching => "  (still fetching)".to_string(),
            _ => "  (no matches)".to_string(),
        });
    }
    lines.extend(
        matches
            .iter()
            .enumerate()
            .map(|(i, m)| format!("  {}. {}", i + 1, m.display_key())),
    );
    lines.join("\n")
}

/// Raw payloads of a full-text search, one per line
fn render_search(input: &str, event: Option<&SearchEvent>) -> String {
    let mut lines = vec![input.to_string()];
    match event {
        None => lines.push("  (still fetching)".to_string()),
        Some(SearchEvent::NoMatch { .. }) => lines.push("  (no matches)".to_string()),
        Some(SearchEvent::Matches { payloads, .. }) => {
            lines.extend(payloads.iter().map(|p| format!("  {}", p)));
        }
    }
    lines.join("\n")
}
