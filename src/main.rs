//! rstream: a live-scrolling pager over a merged media stream.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollMsg   ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (pager)  │ ◄───────── │ (state)  │          │ (render) │
//! └──────────┘  request   └──────────┘          └──────────┘
//!      │                       ▲
//!      │ pull_next()           │ handle_key_event()
//!      ▼                  ┌──────────┐
//! SessionStore            │ input.rs │
//!  (library)              └──────────┘
//! ```
//!
//! * **`poll`**: a background thread that owns the session and pulls pages
//!   on request.
//! * **`app`**: owns all screen state (posts, selection, paging flags).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: wires everything together: parse args, build the session,
//!   set up the terminal, and run the event loop.

mod app;
mod input;
mod poll;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use app::App;
use poll::PollMsg;
use rstream::extract::MatcherChain;
use rstream::http::{build_client, HttpFetcher};
use rstream::source::{FetchMode, RankMode, RedditClient, RssClient, SourceClient};
use rstream::{SessionStore, StreamConfig};

/// Merge several sources into one ranked stream of media posts and page
/// through it.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Sources to merge: subreddit names, or feed names given with --feed.
    sources: Vec<String>,

    /// Order of the merged stream (score | created).
    #[arg(long, default_value_t = RankMode::Score)]
    rank: RankMode,

    /// Listing to fetch from each source (hot | new | top | rising).
    #[arg(long, default_value_t = FetchMode::Hot)]
    mode: FetchMode,

    /// RSS feed as NAME=URL. Switches the upstream from Reddit to RSS.
    #[arg(long = "feed", value_name = "NAME=URL", value_parser = parse_feed)]
    feeds: Vec<(String, String)>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Posts fetched per page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Log file (the terminal belongs to the UI). Defaults to rstream.log in
    /// the temp directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_feed(arg: &str) -> std::result::Result<(String, String), String> {
    let (name, url) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got '{arg}'"))?;
    if name.is_empty() {
        return Err(format!("feed name missing in '{arg}'"));
    }
    url::Url::parse(url).map_err(|e| format!("invalid feed URL '{url}': {e}"))?;
    Ok((name.to_string(), url.to_string()))
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| std::env::temp_dir().join("rstream.log"));
    let file = File::create(&path).with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => StreamConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StreamConfig::default(),
    };
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
        config.max_page_size = config.max_page_size.max(page_size);
    }
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// RAII terminal guard: cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen. When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.clone())?;
    let config = load_config(&args)?;

    // -- configure upstream and extractors -----------------------------------
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let client: Arc<dyn SourceClient> = if args.feeds.is_empty() {
        Arc::new(RedditClient::new(fetcher.clone()))
    } else {
        Arc::new(RssClient::new(build_client(&config)?, args.feeds.clone()))
    };
    let sources = match (args.sources.is_empty(), args.feeds.is_empty()) {
        (false, _) => args.sources.clone(),
        (true, true) => vec!["pics".to_string()],
        (true, false) => args.feeds.iter().map(|(name, _)| name.clone()).collect(),
    };
    let chain = Arc::new(MatcherChain::standard(&config, fetcher));
    let page_size = config.page_size;

    // -- open the session and start the pager --------------------------------
    let store = Arc::new(SessionStore::new(client, chain, config));
    let key = store.create_session(&sources, args.rank, args.mode)?;
    let pager = poll::spawn(Arc::clone(&store), key);

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Forward a pending page request to the pager.
    //   2. Drain any messages from the pager.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        if app.take_page_request() && !pager.request(page_size) {
            app.session_expired();
        }

        while let Ok(msg) = pager.messages.try_recv() {
            match msg {
                PollMsg::Page { posts, exhausted } => app.append_page(posts, exhausted),
                PollMsg::Error(e) => app.page_failed(&e),
                PollMsg::Expired => app.session_expired(),
            }
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // Dropping the pager ends the session; `guard` restores the terminal.
    drop(pager);
    Ok(())
}
