//! Full-screen interactive search.

mod app;
mod ui;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, Stdout},
    panic,
};
use tokio::sync::mpsc::{self, UnboundedSender};
use weather_core::{Config, SearchHistory, WeatherLookup};

use app::{Action, App, AppMessage};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(config: Config) -> Result<()> {
    let lookup = WeatherLookup::from_config(&config)?;
    let history = SearchHistory::load_or_empty(
        config.history_file_path()?,
        config.history.max_entries,
    );
    let app = App::new(history, config.history.enabled);

    install_panic_hook();
    enable_raw_mode()?;
    let _guard = TerminalGuard { restore: restore_terminal };
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    event_loop(&mut terminal, app, lookup).await
}

/// Leaves raw mode and the alternate screen when dropped, whether `run`
/// returns normally, bails out with `?` or unwinds.
struct TerminalGuard {
    restore: fn() -> io::Result<()>,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = (self.restore)();
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}

/// Restore the terminal before the panic message is printed, so it stays readable.
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));
}

async fn event_loop(terminal: &mut Tui, mut app: App, lookup: WeatherLookup) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { return Ok(()) };
                // Releases and repeats are reported on some platforms.
                if let Event::Key(key) = event? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match app.handle_key(key) {
                        Action::None => {}
                        Action::Quit => return Ok(()),
                        Action::Search(query) => spawn_lookup(&lookup, query, tx.clone()),
                        Action::Suggest(query) => spawn_suggest(&lookup, query, tx.clone()),
                    }
                }
            }
            Some(msg) = rx.recv() => app.on_message(msg),
        }
    }
}

fn spawn_lookup(lookup: &WeatherLookup, query: String, tx: UnboundedSender<AppMessage>) {
    let lookup = lookup.clone();
    tokio::spawn(async move {
        let result = lookup.lookup(&query).await.map_err(|err| err.to_string());
        let _ = tx.send(AppMessage::Lookup { query, result });
    });
}

fn spawn_suggest(lookup: &WeatherLookup, query: String, tx: UnboundedSender<AppMessage>) {
    let resolver = lookup.resolver().clone();
    tokio::spawn(async move {
        // A failed suggestion request just shows nothing.
        let matches = resolver.suggest(&query).await.unwrap_or_default();
        let _ = tx.send(AppMessage::Suggestions { query, matches });
    });
}
