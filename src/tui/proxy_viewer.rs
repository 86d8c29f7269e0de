//! TUI for browsing the proxy list with filters and timed refresh

use crate::proxy::view::cycle_option;
use crate::proxy::{
    AutoRefresh, CountryNames, FilterSelection, Generation, ProxyLoader, ProxyRecord, ProxyView,
    RecordSource,
};
use crate::tui::{restore_terminal, setup_terminal, step_index, SystemClipboard, Term};
use crate::Result;
use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Messages delivered to the viewer loop from timers and load tasks
#[derive(Debug, Clone)]
pub(crate) enum ViewerEvent {
    RefreshTick,
    Loaded {
        ticket: u64,
        result: std::result::Result<Vec<ProxyRecord>, String>,
    },
}

/// Proxy list viewer application state
pub struct ProxyViewerApp {
    /// Source of the proxy records
    loader: ProxyLoader,
    /// Country code display names
    names: CountryNames,
    /// Base, filtered and revealed records
    view: ProxyView,
    /// Guards against stale load results
    generation: Generation,
    /// Periodic reload timer
    auto_refresh: AutoRefresh,
    /// Auto-refresh period
    refresh_interval: Duration,
    tx: UnboundedSender<ViewerEvent>,
    rx: UnboundedReceiver<ViewerEvent>,
    /// Failure notice replacing the table body after a failed load
    load_error: Option<String>,
    /// Whether a load is in flight
    loading: bool,
    /// Time of the last successful load
    last_loaded: Option<DateTime<Local>>,
    table_state: TableState,
    clipboard: SystemClipboard,
    /// Status message
    status_message: String,
    /// Whether the user wants to quit
    should_quit: bool,
}

impl ProxyViewerApp {
    pub fn new(
        loader: ProxyLoader,
        names: CountryNames,
        page_size: usize,
        refresh_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            loader,
            names,
            view: ProxyView::new(page_size),
            generation: Generation::new(),
            auto_refresh: AutoRefresh::new(),
            refresh_interval,
            tx,
            rx,
            load_error: None,
            loading: false,
            last_loaded: None,
            table_state: TableState::default(),
            clipboard: SystemClipboard::new(),
            status_message: "Loading...".to_string(),
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.run_app(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn run_app(&mut self, terminal: &mut Term) -> Result<()> {
        self.reload();
        self.auto_refresh
            .start(self.refresh_interval, self.tx.clone(), ViewerEvent::RefreshTick);

        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code, key.modifiers);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            while let Ok(event) = self.rx.try_recv() {
                self.handle_event(event);
            }
        }

        self.auto_refresh.stop();
        Ok(())
    }

    /// Start a reload; its result arrives as [`ViewerEvent::Loaded`]
    fn reload(&mut self) {
        let ticket = self.generation.begin();
        let loader = self.loader.clone();
        let tx = self.tx.clone();
        self.loading = true;
        log::debug!("Reload #{} from {}", ticket, loader.source());

        tokio::spawn(async move {
            let result = loader.load_records().await.map_err(|e| e.to_string());
            let _ = tx.send(ViewerEvent::Loaded { ticket, result });
        });
    }

    pub(crate) fn handle_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::RefreshTick => {
                log::info!("Auto-refresh");
                self.reload();
            }
            ViewerEvent::Loaded { ticket, result } => self.apply_loaded(ticket, result),
        }
    }

    /// Apply a finished load if it is still the latest one
    ///
    /// The filter selection in effect right now is re-applied to the new
    /// records. A failed load leaves the previous records in memory.
    pub(crate) fn apply_loaded(
        &mut self,
        ticket: u64,
        result: std::result::Result<Vec<ProxyRecord>, String>,
    ) {
        if !self.generation.is_current(ticket) {
            log::debug!("Discarding stale load #{}", ticket);
            return;
        }
        self.loading = false;

        match result {
            Ok(records) => {
                self.view.replace_records(records);
                self.load_error = None;
                self.last_loaded = Some(Local::now());
                self.reset_cursor();
                self.status_message = format!("Loaded {} records", self.view.base().len());
            }
            Err(e) => {
                log::warn!("Failed to load proxy list: {}", e);
                self.load_error = Some(e);
                self.status_message = "Failed to load".to_string();
            }
        }
    }

    fn reset_cursor(&mut self) {
        let first = (self.view.shown_count() > 0).then_some(0);
        self.table_state.select(first);
    }

    fn set_selection(&mut self, selection: FilterSelection) {
        self.view.apply_filter(selection);
        self.reset_cursor();
        self.status_message = format!("{} matching records", self.view.filtered_len());
    }

    fn copy(&mut self, text: Option<String>, what: &str) {
        let Some(text) = text else {
            self.status_message = format!("No {} to copy", what);
            return;
        };
        self.status_message = match self.clipboard.set(&text) {
            Ok(()) => format!("Copied all {}", what),
            Err(e) => {
                log::warn!("Copy failed: {}", e);
                e.to_string()
            }
        };
    }

    pub(crate) fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let options = self.view.options().clone();
        let selection = self.view.selection().clone();

        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                let forward = key == KeyCode::Char('c');
                let country = cycle_option(selection.country.as_deref(), &options.countries, forward);
                self.set_selection(FilterSelection { country, ..selection });
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                let forward = key == KeyCode::Char('p');
                let port = cycle_option(selection.port.as_deref(), &options.ports, forward);
                self.set_selection(FilterSelection { port, ..selection });
            }
            KeyCode::Char('a') => self.set_selection(FilterSelection::default()),
            KeyCode::Char('r') => {
                self.status_message = "Refreshing...".to_string();
                self.reload();
            }
            KeyCode::Char('t') => {
                if self.auto_refresh.is_running() {
                    self.auto_refresh.stop();
                    self.status_message = "Auto-refresh off".to_string();
                } else {
                    self.auto_refresh
                        .start(self.refresh_interval, self.tx.clone(), ViewerEvent::RefreshTick);
                    self.status_message = "Auto-refresh on".to_string();
                }
            }
            KeyCode::Char('m') | KeyCode::Enter => {
                let added = self.view.load_more();
                if added > 0 {
                    self.status_message = format!(
                        "Showing {} of {}",
                        self.view.shown_count(),
                        self.view.filtered_len()
                    );
                }
            }
            KeyCode::Char('y') => {
                let text = self.view.addresses_text();
                self.copy(text, "addresses");
            }
            KeyCode::Char('Y') => {
                let text = self.view.csv_text();
                self.copy(text, "records");
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::PageDown => self.move_cursor(20),
            KeyCode::PageUp => self.move_cursor(-20),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = step_index(self.table_state.selected(), delta, self.view.shown_count());
        self.table_state.select(next);
    }

    fn load_more_hint(&self) -> String {
        if !self.view.has_more() {
            return String::new();
        }
        let remaining = self.view.filtered_len() - self.view.shown_count();
        format!("  [m] load {} more", remaining.min(self.view.page_size()))
    }

    fn filter_label(&self) -> String {
        let selection = self.view.selection();
        let country = selection
            .country
            .as_deref()
            .map(|c| format!("{} ({})", self.names.display(c), c))
            .unwrap_or_else(|| "All".to_string());
        let port = selection.port.as_deref().unwrap_or("All");
        format!(" Country: {}  |  Port: {} ", country, port)
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title + clock
                Constraint::Length(3), // Filters
                Constraint::Min(0),    // Table
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        let updated = self
            .last_loaded
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        let title = Paragraph::new(format!(
            "Proxy List  |  Time: {}  |  Updated: {}{}",
            Local::now().format("%H:%M:%S"),
            updated,
            if self.loading { "  (loading)" } else { "" }
        ))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let filters = Paragraph::new(self.filter_label())
            .block(Block::default().borders(Borders::ALL).title("Filters"));
        f.render_widget(filters, chunks[1]);

        self.render_table(f, chunks[2]);

        let load_more = self.load_more_hint();
        let status = Paragraph::new(format!(
            "{}{}  |  c/C country  p/P port  a all  r refresh  t timer  y/Y copy  q quit",
            self.status_message, load_more
        ))
        .style(if self.load_error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        })
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[3]);
    }

    fn render_table(&mut self, f: &mut Frame, area: ratatui::layout::Rect) {
        let widths = [
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(10),
        ];
        let header = Row::new(vec!["IP", "Port", "Country", "Provider"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let title = format!(
            "Records ({}/{} shown, {} total)",
            self.view.shown_count(),
            self.view.filtered_len(),
            self.view.base().len()
        );

        let rows: Vec<Row> = if self.load_error.is_some() {
            vec![Row::new(vec![Cell::from("Failed to load")]).style(Style::default().fg(Color::Red))]
        } else if self.view.filtered_len() == 0 {
            vec![Row::new(vec![Cell::from("No data")])]
        } else {
            self.view
                .visible()
                .map(|r| {
                    Row::new(vec![
                        r.address.clone(),
                        r.port.clone(),
                        r.country.clone(),
                        r.provider.clone(),
                    ])
                })
                .collect()
        };

        let table = Table::new(rows)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .widths(&widths)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ResourceLocation;
    use reqwest::Client;
    use std::path::PathBuf;

    fn app(page_size: usize) -> ProxyViewerApp {
        let loader = ProxyLoader::new(
            Client::new(),
            ResourceLocation::File(PathBuf::from("/nonexistent/alive.txt")),
        );
        ProxyViewerApp::new(loader, CountryNames::default(), page_size, Duration::from_secs(600))
    }

    fn records() -> Vec<ProxyRecord> {
        (0..30)
            .map(|i| {
                let country = if i % 3 == 0 { "DE" } else { "US" };
                ProxyRecord::new(format!("10.0.0.{}", i), "8080", country, "p")
            })
            .collect()
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut app = app(10);
        let old = app.generation.begin();
        let new = app.generation.begin();

        app.apply_loaded(new, Ok(records()));
        app.apply_loaded(old, Ok(vec![ProxyRecord::new("9.9.9.9", "1", "FR", "x")]));

        assert_eq!(app.view.base().len(), 30);
    }

    #[test]
    fn test_failed_load_keeps_records() {
        let mut app = app(10);
        let first = app.generation.begin();
        app.apply_loaded(first, Ok(records()));

        let second = app.generation.begin();
        app.apply_loaded(second, Err("HTTP 500".to_string()));

        assert_eq!(app.view.base().len(), 30);
        assert_eq!(app.load_error.as_deref(), Some("HTTP 500"));

        let third = app.generation.begin();
        app.apply_loaded(third, Ok(records()));
        assert!(app.load_error.is_none());
    }

    #[test]
    fn test_filter_keys_and_load_more() {
        let mut app = app(5);
        let ticket = app.generation.begin();
        app.apply_loaded(ticket, Ok(records()));

        assert_eq!(app.load_more_hint(), "  [m] load 5 more");

        app.handle_input(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(app.view.selection().country.as_deref(), Some("DE"));
        assert_eq!(app.view.filtered_len(), 10);
        assert_eq!(app.view.shown_count(), 5);

        app.handle_input(KeyCode::Char('m'), KeyModifiers::NONE);
        assert_eq!(app.view.shown_count(), 10);
        assert!(!app.view.has_more());
        assert_eq!(app.load_more_hint(), "");

        app.handle_input(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(app.view.selection(), &FilterSelection::default());
        assert_eq!(app.view.shown_count(), 5);
    }

    #[test]
    fn test_reload_keeps_active_filter() {
        let mut app = app(50);
        let ticket = app.generation.begin();
        app.apply_loaded(ticket, Ok(records()));
        app.handle_input(KeyCode::Char('C'), KeyModifiers::NONE);
        assert_eq!(app.view.selection().country.as_deref(), Some("US"));
        let before: Vec<ProxyRecord> = app.view.visible().cloned().collect();

        let ticket = app.generation.begin();
        app.apply_loaded(ticket, Ok(records()));
        let after: Vec<ProxyRecord> = app.view.visible().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_copy_with_nothing_filtered() {
        let mut app = app(5);
        app.handle_input(KeyCode::Char('y'), KeyModifiers::NONE);
        assert_eq!(app.status_message, "No addresses to copy");
    }
}
