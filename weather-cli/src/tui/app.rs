//! Interactive UI state and key handling. No I/O happens here: key handling
//! returns an [`Action`] for the event loop to carry out.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;
use weather_core::{GeoMatch, Report, SearchHistory, resolver::MIN_SUGGEST_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Input,
    Loading,
    Report,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Search,
    History,
}

/// Work the event loop should start after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Search(String),
    Suggest(String),
}

/// Results delivered back from background tasks.
#[derive(Debug)]
pub enum AppMessage {
    Suggestions { query: String, matches: Vec<GeoMatch> },
    Lookup { query: String, result: Result<Report, String> },
}

#[derive(Debug)]
pub struct App {
    pub input: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub mode: Mode,
    pub screen: Screen,
    pub pane: Pane,
    pub report: Option<Report>,
    pub error: String,
    pub suggestions: Vec<GeoMatch>,
    pub selected_suggestion: usize,
    pub show_suggestions: bool,
    last_suggest_query: String,
    pub history: SearchHistory,
    pub selected_history: usize,
    history_enabled: bool,
}

impl App {
    pub fn new(history: SearchHistory, history_enabled: bool) -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            mode: Mode::Normal,
            screen: Screen::Input,
            pane: Pane::Search,
            report: None,
            error: String::new(),
            suggestions: Vec::new(),
            selected_suggestion: 0,
            show_suggestions: false,
            last_suggest_query: String::new(),
            history,
            selected_history: 0,
            history_enabled,
        }
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.input.char_indices().nth(char_pos).map(|(i, _)| i).unwrap_or(self.input.len())
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_pos(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character under the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_pos(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_pos(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    pub fn next_word(&mut self) {
        let chars: Vec<char> = self.input.chars().collect();
        let mut pos = self.cursor;
        while pos < chars.len() && !chars[pos].is_whitespace() {
            pos += 1;
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        self.cursor = pos;
    }

    pub fn prev_word(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let chars: Vec<char> = self.input.chars().collect();
        let mut pos = self.cursor - 1;
        while pos > 0 && chars[pos].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        self.cursor = pos;
    }

    pub fn next_suggestion(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected_suggestion = (self.selected_suggestion + 1) % self.suggestions.len();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected_suggestion =
                self.selected_suggestion.checked_sub(1).unwrap_or(self.suggestions.len() - 1);
        }
    }

    pub fn accept_suggestion(&mut self) {
        if !self.show_suggestions {
            return;
        }
        if let Some(found) = self.suggestions.get(self.selected_suggestion) {
            self.input = found.query_text();
            self.cursor = self.char_count();
            self.hide_suggestions();
        }
    }

    fn hide_suggestions(&mut self) {
        self.show_suggestions = false;
        self.suggestions.clear();
        self.selected_suggestion = 0;
    }

    pub fn next_history(&mut self) {
        let len = self.history.len();
        if len > 0 {
            self.selected_history = (self.selected_history + 1) % len;
        }
    }

    pub fn prev_history(&mut self) {
        let len = self.history.len();
        if len > 0 {
            self.selected_history = self.selected_history.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn load_selected_history(&mut self) {
        if let Some(entry) = self.history.entries().get(self.selected_history) {
            self.input = entry.query.clone();
            self.cursor = self.char_count();
            self.pane = Pane::Search;
            self.mode = Mode::Insert;
        }
    }

    fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Search => Pane::History,
            Pane::History => Pane::Search,
        };
    }

    fn start_search(&mut self) -> Action {
        let query = self.input.trim().to_string();
        if query.is_empty() {
            return Action::None;
        }
        self.screen = Screen::Loading;
        self.show_suggestions = false;
        Action::Search(query)
    }

    /// Ask for suggestions when the input is long enough and has changed.
    fn maybe_suggest(&mut self) -> Action {
        if self.char_count() < MIN_SUGGEST_CHARS {
            self.hide_suggestions();
            return Action::None;
        }
        if self.input == self.last_suggest_query {
            return Action::None;
        }
        self.last_suggest_query = self.input.clone();
        Action::Suggest(self.input.clone())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.screen {
            Screen::Input => match self.mode {
                Mode::Normal => self.handle_normal(key),
                Mode::Insert => self.handle_insert(key),
            },
            Screen::Report | Screen::Error => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => return Action::Quit,
                    KeyCode::Char('i') => self.mode = Mode::Insert,
                    _ => self.mode = Mode::Normal,
                }
                self.screen = Screen::Input;
                self.error.clear();
                self.show_suggestions = false;
                Action::None
            }
            Screen::Loading => Action::None,
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('i') => self.mode = Mode::Insert,
            KeyCode::Char('I') => {
                self.mode = Mode::Insert;
                self.move_start();
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Insert;
                self.move_right();
            }
            KeyCode::Char('A') => {
                self.mode = Mode::Insert;
                self.move_end();
            }
            KeyCode::Char('h') if self.pane == Pane::Search => self.move_left(),
            KeyCode::Char('l') if self.pane == Pane::Search => self.move_right(),
            KeyCode::Char('j') if self.pane == Pane::History => self.next_history(),
            KeyCode::Char('k') if self.pane == Pane::History => self.prev_history(),
            KeyCode::Char('0') | KeyCode::Char('^') => self.move_start(),
            KeyCode::Char('$') => self.move_end(),
            KeyCode::Char('w') => self.next_word(),
            KeyCode::Char('b') => self.prev_word(),
            KeyCode::Char('x') => self.delete_char(),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear_input()
            }
            KeyCode::Tab => self.toggle_pane(),
            KeyCode::Enter => match self.pane {
                Pane::History => self.load_selected_history(),
                Pane::Search => return self.start_search(),
            },
            KeyCode::Esc => return Action::Quit,
            _ => {}
        }
        Action::None
    }

    fn handle_insert(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.move_left();
                self.show_suggestions = false;
            }
            KeyCode::Char(c) => {
                self.insert_char(c);
                return self.maybe_suggest();
            }
            KeyCode::Backspace => {
                self.backspace();
                return self.maybe_suggest();
            }
            KeyCode::Delete => self.delete_char(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_start(),
            KeyCode::End => self.move_end(),
            KeyCode::Down if self.show_suggestions => self.next_suggestion(),
            KeyCode::Up if self.show_suggestions => self.prev_suggestion(),
            KeyCode::Tab => {
                if self.show_suggestions {
                    self.accept_suggestion();
                } else {
                    self.toggle_pane();
                }
            }
            KeyCode::Enter => {
                if self.show_suggestions && !self.suggestions.is_empty() {
                    self.accept_suggestion();
                } else {
                    return self.start_search();
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn on_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Suggestions { query, matches } => {
                // Drop results for input the user has since changed.
                if self.screen == Screen::Input && self.mode == Mode::Insert && query == self.input {
                    self.show_suggestions = !matches.is_empty();
                    self.suggestions = matches;
                    self.selected_suggestion = 0;
                }
            }
            AppMessage::Lookup { query, result } => {
                if self.screen != Screen::Loading {
                    return;
                }
                match result {
                    Ok(report) => {
                        self.record_search(&query);
                        self.report = Some(report);
                        self.screen = Screen::Report;
                        self.clear_input();
                        self.mode = Mode::Normal;
                        self.hide_suggestions();
                    }
                    Err(message) => {
                        self.error = message;
                        self.screen = Screen::Error;
                    }
                }
            }
        }
    }

    fn record_search(&mut self, query: &str) {
        if !self.history_enabled {
            return;
        }
        self.history.record(query, Utc::now());
        self.selected_history = 0;
        if let Err(err) = self.history.save() {
            warn!("failed to save search history: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::tests::sample_report;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App {
        App::new(SearchHistory::empty("unused-history.json", 10), false)
    }

    fn type_into(app: &mut App, text: &str) {
        app.handle_key(key(KeyCode::Char('i')));
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn typed(text: &str) -> App {
        let mut app = app();
        type_into(&mut app, text);
        app
    }

    fn place(name: &str, country: &str) -> GeoMatch {
        GeoMatch {
            name: name.into(),
            latitude: 0.0,
            longitude: 0.0,
            country: Some(country.into()),
            country_code: None,
            admin1: None,
            timezone: None,
        }
    }

    #[test]
    fn editing_is_character_indexed() {
        let mut app = typed("Zürich");
        assert_eq!(app.cursor, 6);

        app.move_left();
        app.move_left();
        app.move_left();
        app.move_left();
        app.backspace();
        assert_eq!(app.input, "Zrich");
        app.insert_char('ü');
        assert_eq!(app.input, "Zürich");

        app.move_start();
        app.delete_char();
        assert_eq!(app.input, "ürich");
        app.move_end();
        app.move_right();
        assert_eq!(app.cursor, 5);
    }

    #[test]
    fn word_motions() {
        let mut app = typed("new  york city");
        app.move_start();
        app.next_word();
        assert_eq!(app.cursor, 5);
        app.next_word();
        assert_eq!(app.cursor, 10);
        app.next_word();
        assert_eq!(app.cursor, 14);
        app.prev_word();
        assert_eq!(app.cursor, 10);
        app.prev_word();
        assert_eq!(app.cursor, 5);
        app.prev_word();
        assert_eq!(app.cursor, 0);
        app.prev_word();
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn suggestions_requested_from_third_char_once_per_text() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('i')));
        assert_eq!(app.handle_key(key(KeyCode::Char('O'))), Action::None);
        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), Action::None);
        assert_eq!(app.handle_key(key(KeyCode::Char('l'))), Action::Suggest("Osl".into()));
        assert_eq!(app.handle_key(key(KeyCode::Backspace)), Action::None);
        assert_eq!(app.handle_key(key(KeyCode::Char('l'))), Action::None);
        assert_eq!(app.handle_key(key(KeyCode::Char('o'))), Action::Suggest("Oslo".into()));
    }

    #[test]
    fn stale_suggestions_are_discarded() {
        let mut app = typed("Lond");
        app.on_message(AppMessage::Suggestions {
            query: "Lon".into(),
            matches: vec![place("London", "United Kingdom")],
        });
        assert!(!app.show_suggestions);

        app.on_message(AppMessage::Suggestions {
            query: "Lond".into(),
            matches: vec![place("London", "United Kingdom"), place("London", "Canada")],
        });
        assert!(app.show_suggestions);
        assert_eq!(app.suggestions.len(), 2);
    }

    #[test]
    fn suggestion_selection_wraps_and_accepts() {
        let mut app = typed("Lond");
        app.on_message(AppMessage::Suggestions {
            query: "Lond".into(),
            matches: vec![place("London", "United Kingdom"), place("London", "Canada")],
        });

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_suggestion, 1);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_suggestion, 0);
        app.handle_key(key(KeyCode::Down));

        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.input, "London, Canada");
        assert_eq!(app.cursor, app.input.chars().count());
        assert!(!app.show_suggestions);

        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::Search("London, Canada".into()));
        assert_eq!(app.screen, Screen::Loading);
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut app = typed("   ");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.screen, Screen::Input);
    }

    #[test]
    fn successful_lookup_shows_report_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut app = App::new(SearchHistory::empty(&path, 10), true);
        type_into(&mut app, "Lisbon");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::Search("Lisbon".into()));

        app.on_message(AppMessage::Lookup { query: "Lisbon".into(), result: Ok(sample_report()) });

        assert_eq!(app.screen, Screen::Report);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.input.is_empty());
        assert_eq!(app.history.entries()[0].query, "Lisbon");
        assert_eq!(SearchHistory::load(&path, 10).unwrap().entries()[0].query, "Lisbon");

        assert_eq!(app.handle_key(key(KeyCode::Char('i'))), Action::None);
        assert_eq!(app.screen, Screen::Input);
        assert_eq!(app.mode, Mode::Insert);
    }

    #[test]
    fn disabled_history_is_left_alone() {
        let mut app = typed("Lisbon");
        app.handle_key(key(KeyCode::Enter));
        app.on_message(AppMessage::Lookup { query: "Lisbon".into(), result: Ok(sample_report()) });

        assert_eq!(app.screen, Screen::Report);
        assert!(app.history.is_empty());
    }

    #[test]
    fn failed_lookup_shows_error_then_any_key_returns() {
        let mut app = typed("Atlantis");
        app.handle_key(key(KeyCode::Enter));
        app.on_message(AppMessage::Lookup {
            query: "Atlantis".into(),
            result: Err("invalid location 'Atlantis': not found".into()),
        });

        assert_eq!(app.screen, Screen::Error);
        assert!(app.error.contains("not found"));
        assert!(app.history.is_empty());

        app.handle_key(key(KeyCode::Char('z')));
        assert_eq!(app.screen, Screen::Input);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.error.is_empty());
        assert_eq!(app.input, "Atlantis");
    }

    #[test]
    fn history_navigation_and_load() {
        let mut app = app();
        app.history.record("Rome", Utc::now());
        app.history.record("Oslo", Utc::now());
        app.history.record("Kyiv", Utc::now());

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.pane, Pane::History);
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.selected_history, 2);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_history, 1);

        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.input, "Oslo");
        assert_eq!(app.pane, Pane::Search);
        assert_eq!(app.mode, Mode::Insert);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);

        let mut app = typed("Paris");
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::None);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.cursor, 4);
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn ctrl_d_clears_input_in_normal_mode() {
        let mut app = typed("Paris");
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(ctrl('d'));
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }
}
