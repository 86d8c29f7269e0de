//! TUI for batch address lookup with an ASN detail panel

use crate::lookup::history::{fetch_summary, today_utc, PrefixSource, PrefixSummary};
use crate::lookup::models::RESULT_COLUMNS;
use crate::lookup::{
    parse_address_list, AddressInfo, AddressSource, LookupOrchestrator, LookupRow, PrefixQuery,
    RowRegistry,
};
use crate::proxy::Generation;
use crate::tui::{centered_rect, restore_terminal, setup_terminal, step_index, Term};
use crate::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Messages delivered to the lookup loop from background tasks
#[derive(Debug)]
pub(crate) enum LookupEvent {
    Row(LookupRow),
    BatchDone,
    History {
        ticket: u64,
        result: std::result::Result<PrefixSummary, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    /// Typing addresses
    Input,
    /// Browsing result rows
    Results,
    /// Detail panel open
    Detail,
}

/// State of the detail panel for one selected row
pub(crate) struct DetailPanel {
    info: AddressInfo,
    date_input: String,
    summary_line: String,
    prefixes: Vec<String>,
    note: Option<String>,
}

impl DetailPanel {
    fn new(info: AddressInfo) -> Self {
        Self {
            info,
            date_input: today_utc().format("%Y-%m-%d").to_string(),
            summary_line: String::new(),
            prefixes: Vec::new(),
            note: None,
        }
    }
}

/// Lookup application state
pub struct LookupApp<S, P> {
    orchestrator: LookupOrchestrator<S>,
    prefixes: Arc<P>,
    /// Raw pasted addresses
    input: String,
    /// Rendered result rows; success rows carry a registry id
    rows: Vec<(Option<Uuid>, LookupRow)>,
    registry: RowRegistry,
    detail: Option<DetailPanel>,
    /// Guards the detail panel against late history results
    history_generation: Generation,
    focus: Focus,
    table_state: TableState,
    tx: UnboundedSender<LookupEvent>,
    rx: UnboundedReceiver<LookupEvent>,
    message: String,
    should_quit: bool,
}

impl<S, P> LookupApp<S, P>
where
    S: AddressSource + 'static,
    P: PrefixSource + 'static,
{
    pub fn new(orchestrator: LookupOrchestrator<S>, prefixes: P, initial_input: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            prefixes: Arc::new(prefixes),
            input: initial_input,
            rows: Vec::new(),
            registry: RowRegistry::new(),
            detail: None,
            history_generation: Generation::new(),
            focus: Focus::Input,
            table_state: TableState::default(),
            tx,
            rx,
            message: "Paste addresses, one per line. Ctrl+S to query.".to_string(),
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
        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_input(key.code, key.modifiers);
                    }
                    Event::Paste(text) if self.focus == Focus::Input => self.input.push_str(&text),
                    _ => {}
                }
            }
            if self.should_quit {
                break;
            }

            while let Ok(event) = self.rx.try_recv() {
                self.handle_event(event);
            }
        }
        Ok(())
    }

    /// Validate the pasted list and start a batch in the background
    pub(crate) fn submit(&mut self) {
        let addresses = parse_address_list(&self.input);
        // claimed here so a second submit is refused before the task runs
        let guard = match self.orchestrator.begin(&addresses) {
            Ok(guard) => guard,
            Err(e) => {
                self.message = e.to_string();
                return;
            }
        };

        self.rows.clear();
        self.registry.clear();
        self.table_state.select(None);
        self.message = format!("Querying {} addresses...", addresses.len());

        let orchestrator = self.orchestrator.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let row_tx = tx.clone();
            orchestrator
                .run_guarded(guard, &addresses, |_, row| {
                    let _ = row_tx.send(LookupEvent::Row(row));
                })
                .await;
            let _ = tx.send(LookupEvent::BatchDone);
        });
    }

    pub(crate) fn handle_event(&mut self, event: LookupEvent) {
        match event {
            LookupEvent::Row(row) => {
                let id = row.info().cloned().map(|info| self.registry.register(info));
                self.rows.push((id, row));
                if self.table_state.selected().is_none() {
                    self.table_state.select(Some(0));
                }
            }
            LookupEvent::BatchDone => {
                let failed = self.rows.iter().filter(|(_, r)| !r.is_success()).count();
                self.message = format!("Done: {} rows, {} failed", self.rows.len(), failed);
                if self.focus == Focus::Input {
                    self.focus = Focus::Results;
                }
            }
            LookupEvent::History { ticket, result } => {
                if !self.history_generation.is_current(ticket) {
                    return;
                }
                let Some(detail) = self.detail.as_mut() else {
                    return;
                };
                match result {
                    Ok(summary) => {
                        detail.summary_line = summary.headline();
                        detail.prefixes = summary.sample().to_vec();
                        detail.note = summary.note();
                    }
                    Err(e) => {
                        detail.summary_line = format!("Query failed: {}", e);
                        detail.prefixes.clear();
                        detail.note = None;
                    }
                }
            }
        }
    }

    /// Open the detail panel for the selected row, if it succeeded
    pub(crate) fn open_detail(&mut self) {
        let Some(index) = self.table_state.selected() else {
            return;
        };
        let Some((Some(id), _)) = self.rows.get(index) else {
            return;
        };
        if let Some(info) = self.registry.get(id) {
            // invalidate any history query still running for a previous panel
            self.history_generation.begin();
            self.detail = Some(DetailPanel::new(info.clone()));
            self.focus = Focus::Detail;
        }
    }

    fn close_detail(&mut self) {
        self.history_generation.begin();
        self.detail = None;
        self.focus = Focus::Results;
    }

    /// Query announced prefixes for the open panel's ASN and date
    pub(crate) fn query_history(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let query = match PrefixQuery::parse(detail.info.asn_number.as_deref(), &detail.date_input) {
            Ok(query) => query,
            Err(e) => {
                detail.summary_line = e.to_string();
                return;
            }
        };
        detail.summary_line = "Querying...".to_string();
        detail.prefixes.clear();
        detail.note = None;

        let ticket = self.history_generation.begin();
        let source = Arc::clone(&self.prefixes);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetch_summary(source.as_ref(), query)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(LookupEvent::History { ticket, result });
        });
    }

    pub(crate) fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.focus {
            Focus::Input => match key {
                KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => self.submit(),
                KeyCode::Char(c) => self.input.push(c),
                KeyCode::Enter => self.input.push('\n'),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Results,
                _ => {}
            },
            Focus::Results => match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('i') | KeyCode::Tab => self.focus = Focus::Input,
                KeyCode::Char('s') => self.submit(),
                KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
                KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
                KeyCode::Enter => self.open_detail(),
                _ => {}
            },
            Focus::Detail => match key {
                KeyCode::Esc => self.close_detail(),
                KeyCode::Enter => self.query_history(),
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.date_input.push(c);
                    }
                }
                KeyCode::Backspace => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.date_input.pop();
                    }
                }
                _ => {}
            },
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = step_index(self.table_state.selected(), delta, self.rows.len());
        self.table_state.select(next);
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(8), // Address input
                Constraint::Min(0),    // Results
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        let input_style = if self.focus == Focus::Input {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let input = Paragraph::new(self.input.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Addresses (one per line, max 50)")
                    .border_style(input_style),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(input, chunks[0]);

        self.render_results(f, chunks[1]);

        let busy = if self.orchestrator.is_busy() {
            "[querying...] "
        } else {
            "[Ctrl+S / s query] "
        };
        let status = Paragraph::new(format!(
            "{}{}  |  Tab switch  Enter details  q quit",
            busy, self.message
        ))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[2]);

        if let Some(detail) = &self.detail {
            Self::render_detail(f, detail);
        }
    }

    fn render_results(&mut self, f: &mut Frame, area: Rect) {
        let widths = [
            Constraint::Length(16),
            Constraint::Length(20),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(20),
            Constraint::Min(10),
        ];
        let header = Row::new(RESULT_COLUMNS.to_vec())
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|(_, row)| match row {
                LookupRow::Success(info) => Row::new(info.row_cells().to_vec()),
                LookupRow::Failure { address, .. } => Row::new(vec![
                    Cell::from(address.clone()),
                    Cell::from("Lookup failed").style(Style::default().fg(Color::Red)),
                ]),
            })
            .collect();

        let border_style = if self.focus == Focus::Results {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let table = Table::new(rows)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Results ({})", self.rows.len()))
                    .border_style(border_style),
            )
            .widths(&widths)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_detail(f: &mut Frame, detail: &DetailPanel) {
        let area = centered_rect(70, 80, f.size());
        f.render_widget(Clear, area);

        let mut lines: Vec<Line> = detail
            .info
            .detail_fields()
            .into_iter()
            .map(|(label, value)| Line::from(format!("{}: {}", label, value)))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "History date (UTC): {}_   [Enter] query  [Esc] close",
            detail.date_input
        )));
        if !detail.summary_line.is_empty() {
            lines.push(Line::from(detail.summary_line.clone()));
        }
        if !detail.prefixes.is_empty() {
            lines.push(Line::from(detail.prefixes.join("  ")));
        }
        if let Some(note) = &detail.note {
            lines.push(Line::from(note.clone()));
        }

        let panel = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("ASN details")
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(panel, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HistoryError, LookupError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl AddressSource for CountingSource {
        async fn lookup(&self, address: &str) -> std::result::Result<AddressInfo, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AddressInfo {
                address: address.to_string(),
                asn_text: "AS64500 Example".to_string(),
                asn_number: Some("64500".to_string()),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct CountingPrefixes {
        calls: Arc<AtomicUsize>,
    }

    impl PrefixSource for CountingPrefixes {
        async fn announced_prefixes(
            &self,
            _query: &PrefixQuery,
        ) -> std::result::Result<Vec<String>, HistoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["192.0.2.0/24".to_string(), "192.0.2.0/24".to_string()])
        }
    }

    fn app(input: &str) -> (LookupApp<CountingSource, CountingPrefixes>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let source = CountingSource::default();
        let prefixes = CountingPrefixes::default();
        let lookups = Arc::clone(&source.calls);
        let history = Arc::clone(&prefixes.calls);
        let app = LookupApp::new(LookupOrchestrator::new(source), prefixes, input.to_string());
        (app, lookups, history)
    }

    async fn drain(app: &mut LookupApp<CountingSource, CountingPrefixes>, until_done: bool) {
        while let Some(event) = app.rx.recv().await {
            let done = matches!(event, LookupEvent::BatchDone | LookupEvent::History { .. });
            app.handle_event(event);
            if done || !until_done {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_calls() {
        let (mut app, lookups, _) = app("  \n \n");
        app.submit();
        assert_eq!(app.message, "Paste at least one IP address.");
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_fills_rows_and_registry() {
        let (mut app, lookups, _) = app("1.1.1.1\n8.8.8.8\n");
        app.submit();
        drain(&mut app, true).await;

        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.registry.len(), 2);
        assert_eq!(app.rows[0].1.address(), "1.1.1.1");
        assert_eq!(app.focus, Focus::Results);
        assert!(!app.orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_detail_and_history() {
        let (mut app, _, history) = app("1.1.1.1");
        app.submit();
        drain(&mut app, true).await;

        app.open_detail();
        assert_eq!(app.focus, Focus::Detail);

        // a cleared date short-circuits without a request
        app.detail.as_mut().unwrap().date_input.clear();
        app.query_history();
        assert_eq!(app.detail.as_ref().unwrap().summary_line, "Pick a date first.");
        assert_eq!(history.load(Ordering::SeqCst), 0);

        app.detail.as_mut().unwrap().date_input = "2024-01-01".to_string();
        app.query_history();
        drain(&mut app, true).await;

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(history.load(Ordering::SeqCst), 1);
        assert_eq!(detail.prefixes, vec!["192.0.2.0/24"]);
        assert_eq!(detail.summary_line, "Date: 2024-01-01 (UTC), announced prefixes: 1");
    }

    #[tokio::test]
    async fn test_second_submit_refused_while_batch_runs() {
        let (mut app, lookups, _) = app("1.1.1.1\n8.8.8.8\n");
        app.submit();
        app.submit();
        assert_eq!(app.message, "A lookup batch is already running.");

        drain(&mut app, true).await;
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        assert_eq!(app.rows.len(), 2);
        assert!(!app.orchestrator.is_busy());

        // the trigger is usable again once the batch is done
        app.submit();
        drain(&mut app, true).await;
        assert_eq!(lookups.load(Ordering::SeqCst), 4);
        assert_eq!(app.rows.len(), 2);
    }
}
