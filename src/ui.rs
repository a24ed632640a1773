use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use inventory_counts::{
    adjust_line, create_list, format_cents, list_names, load_list, lookup_for_list, record_scan,
    Catalogue, InventoryList, ItemLookup, ManualDetails, Price, StoreError,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

const ACTOR: &str = "tui";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Browsing lines of the current list
    Browse,
    /// Typing the name of a new list
    NewList,
    /// Waiting for a scan / typed code
    ScanCode,
    /// Code resolved, entering details and quantity
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Brand,
    Description,
    Price,
    Qty,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Brand => "Brand",
            Field::Description => "Description",
            Field::Price => "Price",
            Field::Qty => "Qty",
        }
    }
}

/// The details form shown after a code is resolved.
#[derive(Debug, Clone)]
pub struct DetailsForm {
    pub raw_code: String,
    pub lookup: ItemLookup,
    pub brand: String,
    pub description: String,
    pub price: String,
    pub qty: String,
    pub focus: Field,
}

impl DetailsForm {
    fn new(raw_code: String, lookup: ItemLookup) -> Self {
        let resolved = &lookup.resolved;
        let (brand, description, price) = match (&resolved.entry, &lookup.previous) {
            (Some(entry), _) => (entry.brand.clone(), entry.description.clone(), entry.price.to_string()),
            (None, Some(prev)) => (prev.brand.clone(), prev.description.clone(), prev.price.to_string()),
            (None, None) => (String::new(), String::new(), String::new()),
        };
        // Sticker price always wins
        let price = resolved.override_price.map(|p| p.to_string()).unwrap_or(price);

        let mut form = DetailsForm {
            raw_code,
            lookup,
            brand,
            description,
            price,
            qty: "1".to_string(),
            focus: Field::Qty,
        };
        form.focus = form.editable_fields()[0];
        form
    }

    /// Brand/description are locked when the catalogue knows the item;
    /// price is locked for catalogue items and scale labels.
    pub fn editable_fields(&self) -> Vec<Field> {
        let resolved = &self.lookup.resolved;
        let mut fields = Vec::new();
        if resolved.entry.is_none() {
            fields.push(Field::Brand);
            fields.push(Field::Description);
            if resolved.override_price.is_none() {
                fields.push(Field::Price);
            }
        }
        fields.push(Field::Qty);
        fields
    }

    fn next_field(&mut self) {
        let fields = self.editable_fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + 1) % fields.len()];
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Brand => &mut self.brand,
            Field::Description => &mut self.description,
            Field::Price => &mut self.price,
            Field::Qty => &mut self.qty,
        }
    }

    fn manual_details(&self) -> Result<ManualDetails, String> {
        if self.lookup.resolved.entry.is_some() {
            return Ok(ManualDetails::default());
        }
        let price = if self.lookup.resolved.override_price.is_some() || self.price.trim().is_empty() {
            None
        } else {
            Some(Price::parse(&self.price).map_err(|e| e.to_string())?)
        };
        Ok(ManualDetails::new(
            Some(self.brand.trim().to_string()),
            Some(self.description.trim().to_string()),
            price,
        ))
    }

    fn delta(&self) -> Result<i64, String> {
        match self.qty.trim().parse::<i64>() {
            Ok(0) | Err(_) => Err(format!("Quantity must be a non-zero whole number, got {:?}", self.qty)),
            Ok(n) => Ok(n),
        }
    }
}

pub struct App {
    conn: Connection,
    catalogue: Catalogue,
    pub list_names: Vec<String>,
    pub current: usize,
    pub list: Option<InventoryList>,
    pub state: TableState,
    pub mode: Mode,
    pub input: String,
    pub form: Option<DetailsForm>,
    pub status: String,
}

impl App {
    pub fn new(conn: Connection, catalogue: Catalogue) -> Result<Self> {
        let mut app = App {
            conn,
            catalogue,
            list_names: Vec::new(),
            current: 0,
            list: None,
            state: TableState::default(),
            mode: Mode::Browse,
            input: String::new(),
            form: None,
            status: String::new(),
        };
        app.reload_names()?;
        app.reload_list()?;
        app.status = format!("{} catalogue items loaded", app.catalogue.len());
        Ok(app)
    }

    fn reload_names(&mut self) -> Result<()> {
        self.list_names = list_names(&self.conn)?;
        if self.current >= self.list_names.len() {
            self.current = self.list_names.len().saturating_sub(1);
        }
        Ok(())
    }

    fn reload_list(&mut self) -> Result<()> {
        self.list = match self.list_names.get(self.current) {
            Some(name) => load_list(&self.conn, name)?,
            None => None,
        };
        let len = self.list.as_ref().map(|l| l.len()).unwrap_or(0);
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.list_names.get(self.current).map(String::as_str)
    }

    fn selected_key(&self) -> Option<String> {
        let i = self.state.selected()?;
        self.list.as_ref()?.lines().nth(i).map(|(k, _)| k.clone())
    }

    pub fn next_list(&mut self) -> Result<()> {
        if !self.list_names.is_empty() {
            self.current = (self.current + 1) % self.list_names.len();
            self.state.select(None);
            self.reload_list()?;
        }
        Ok(())
    }

    pub fn previous_list(&mut self) -> Result<()> {
        if !self.list_names.is_empty() {
            self.current = (self.current + self.list_names.len() - 1) % self.list_names.len();
            self.state.select(None);
            self.reload_list()?;
        }
        Ok(())
    }

    pub fn next(&mut self) {
        let len = self.list.as_ref().map(|l| l.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.list.as_ref().map(|l| l.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Create the list typed into `input` and switch to it.
    pub fn submit_new_list(&mut self) -> Result<()> {
        let name = self.input.trim().to_string();
        match create_list(&self.conn, &name) {
            Ok(list) => {
                self.reload_names()?;
                self.current = self.list_names.iter().position(|n| *n == list.name).unwrap_or(0);
                self.state.select(None);
                self.reload_list()?;
                self.status = format!("Created list {:?}", list.name);
                self.input.clear();
                self.mode = Mode::ScanCode;
            }
            Err(e) => self.status = e.to_string(),
        }
        Ok(())
    }

    /// Resolve the code in `input` and open the details form.
    pub fn submit_code(&mut self) -> Result<()> {
        let Some(name) = self.current_name().map(str::to_string) else {
            self.status = "Create a list first (n)".to_string();
            self.mode = Mode::Browse;
            return Ok(());
        };
        let raw = self.input.trim().to_string();

        match lookup_for_list(&self.conn, &self.catalogue, &name, &raw) {
            Ok(lookup) => {
                self.status = match (&lookup.resolved.entry, lookup.resolved.shape.is_ambiguous()) {
                    (Some(_), _) => format!("{} found", lookup.resolved.code),
                    (None, true) => format!("{} not found, check the code length", lookup.resolved.code),
                    (None, false) => format!("{} not in catalogue, enter details", lookup.resolved.code),
                };
                self.form = Some(DetailsForm::new(raw, lookup));
                self.mode = Mode::Details;
            }
            Err(e @ StoreError::Barcode(_)) => self.status = e.to_string(),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Count the resolved item and go back to waiting for the next scan.
    pub fn submit_details(&mut self) -> Result<()> {
        let (Some(form), Some(name)) = (self.form.as_ref(), self.current_name()) else {
            self.mode = Mode::ScanCode;
            return Ok(());
        };
        let name = name.to_string();

        let (manual, delta) = match (form.manual_details(), form.delta()) {
            (Ok(m), Ok(d)) => (m, d),
            (Err(e), _) | (_, Err(e)) => {
                self.status = e;
                return Ok(());
            }
        };

        let raw = form.raw_code.clone();
        match record_scan(&mut self.conn, &self.catalogue, &name, &raw, &manual, delta, ACTOR) {
            Ok((_, outcome)) => {
                self.status = if outcome.removed {
                    format!("{} removed", outcome.key)
                } else {
                    format!("{} qty {}", outcome.key, outcome.item.qty)
                };
                self.form = None;
                self.input.clear();
                self.mode = Mode::ScanCode;
                self.reload_list()?;
            }
            Err(e) if e.is_user_error() => self.status = e.to_string(),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// +/- on the selected line
    pub fn adjust_selected(&mut self, delta: i64) -> Result<()> {
        let (Some(key), Some(name)) = (self.selected_key(), self.current_name().map(str::to_string)) else {
            return Ok(());
        };
        let outcome = adjust_line(&mut self.conn, &name, &key, delta, ACTOR)?;
        self.status = if outcome.removed {
            format!("{} removed", outcome.key)
        } else {
            format!("{} qty {}", outcome.key, outcome.item.qty)
        };
        self.reload_list()
    }

    /// Returns false when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                KeyCode::Char('n') => {
                    self.input.clear();
                    self.mode = Mode::NewList;
                }
                KeyCode::Char('s') | KeyCode::Enter => {
                    self.input.clear();
                    self.mode = Mode::ScanCode;
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    self.input = c.to_string();
                    self.mode = Mode::ScanCode;
                }
                KeyCode::Tab | KeyCode::Right => self.next_list()?,
                KeyCode::BackTab | KeyCode::Left => self.previous_list()?,
                KeyCode::Down | KeyCode::Char('j') => self.next(),
                KeyCode::Up | KeyCode::Char('k') => self.previous(),
                KeyCode::Char('+') => self.adjust_selected(1)?,
                KeyCode::Char('-') => self.adjust_selected(-1)?,
                _ => {}
            },
            Mode::NewList | Mode::ScanCode => match key.code {
                KeyCode::Esc => {
                    self.input.clear();
                    self.mode = Mode::Browse;
                }
                KeyCode::Enter if self.mode == Mode::NewList => self.submit_new_list()?,
                KeyCode::Enter => self.submit_code()?,
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Mode::Details => match key.code {
                KeyCode::Esc => {
                    self.form = None;
                    self.mode = Mode::ScanCode;
                }
                KeyCode::Tab => {
                    if let Some(form) = self.form.as_mut() {
                        form.next_field();
                    }
                }
                KeyCode::Enter => self.submit_details()?,
                KeyCode::Backspace => {
                    if let Some(form) = self.form.as_mut() {
                        form.focused_mut().pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(form) = self.form.as_mut() {
                        form.focused_mut().push(c);
                    }
                }
                _ => {}
            },
        }
        Ok(true)
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key)? {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // List tabs
            Constraint::Length(7), // Scan / details panel
            Constraint::Min(0),    // Lines
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_entry(f, chunks[1], app);
    render_table(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    if app.list_names.is_empty() {
        spans.push(Span::styled("No lists yet, press n to create one", Style::default().fg(Color::DarkGray)));
    }
    for (i, name) in app.list_names.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if i == app.current {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(name.as_str(), style));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Lists "),
    );
    f.render_widget(header, area);
}

fn render_entry(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Yellow);
    let lines = match (app.mode, &app.form) {
        (Mode::NewList, _) => vec![Line::from(vec![
            Span::styled("New list name: ", label),
            Span::raw(format!("{}▏", app.input)),
        ])],
        (Mode::Details, Some(form)) => {
            let editable = form.editable_fields();
            let resolved = &form.lookup.resolved;
            let mut lines = vec![Line::from(vec![
                Span::styled("Code: ", label),
                Span::raw(format!("{}  ({})", resolved.code, resolved.shape.as_str())),
                if resolved.is_found() {
                    Span::styled("  catalogue", Style::default().fg(Color::Green))
                } else {
                    Span::styled("  manual entry", Style::default().fg(Color::Red))
                },
            ])];
            for (field, value) in [
                (Field::Brand, &form.brand),
                (Field::Description, &form.description),
                (Field::Price, &form.price),
                (Field::Qty, &form.qty),
            ] {
                let focused = form.focus == field;
                let style = if focused {
                    Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if editable.contains(&field) {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<12}", field.label()), label),
                    Span::styled(format!("{}{}", value, if focused { "▏" } else { "" }), style),
                ]));
            }
            lines
        }
        _ => vec![Line::from(vec![
            Span::styled("Item code: ", label),
            Span::raw(format!("{}{}", app.input, if app.mode == Mode::ScanCode { "▏" } else { "" })),
        ])],
    };

    let title = match app.mode {
        Mode::Details => " Details (Tab next field, Enter count, Esc cancel) ",
        Mode::NewList => " New List ",
        _ => " Scan ",
    };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );
    f.render_widget(panel, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Code", "Brand", "Description", "Price", "Qty", "Total"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let (rows, title): (Vec<Row>, String) = match &app.list {
        Some(list) => (
            list.lines()
                .map(|(_, item)| {
                    let code_style = if item.scale {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from(item.code.to_string()).style(code_style),
                        Cell::from(truncate(&item.brand, 18)),
                        Cell::from(truncate(&item.description, 32)),
                        Cell::from(item.price.to_string()),
                        Cell::from(item.qty.to_string()),
                        Cell::from(format_cents(item.total_cents())),
                    ])
                    .height(1)
                })
                .collect(),
            format!(
                " {}  |  Grand Total: ${} ",
                list.name,
                format_cents(list.grand_total_cents())
            ),
        ),
        None => (Vec::new(), " Lines ".to_string()),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(15),
            Constraint::Length(20),
            Constraint::Length(34),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = vec![Span::styled(format!(" {} ", app.status), Style::default().fg(Color::Cyan))];

    if app.mode == Mode::Browse {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("s", key));
        spans.push(Span::raw(" Scan | "));
        spans.push(Span::styled("n", key));
        spans.push(Span::raw(" New list | "));
        spans.push(Span::styled("Tab", key));
        spans.push(Span::raw(" List | "));
        spans.push(Span::styled("+/-", key));
        spans.push(Span::raw(" Qty | "));
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
    } else {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("Esc", key));
        spans.push(Span::raw(" Back"));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use inventory_counts::{setup_database, CanonicalCode, CatalogueEntry};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn test_app() -> App {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let catalogue = Catalogue::from_entries(vec![CatalogueEntry {
            code: CanonicalCode::new("0061414100003").unwrap(),
            brand: "Acme".to_string(),
            description: "Peanut Butter".to_string(),
            price: Price::from_cents(499),
            subdept: String::new(),
        }]);
        App::new(conn, catalogue).unwrap()
    }

    fn with_list(name: &str) -> App {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        type_str(&mut app, name);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app
    }

    #[test]
    fn test_create_list_then_scan_mode() {
        let app = with_list("Aisle 4");
        assert_eq!(app.list_names, vec!["Aisle 4".to_string()]);
        assert_eq!(app.mode, Mode::ScanCode);
    }

    #[test]
    fn test_catalogue_item_counts_with_locked_fields() {
        let mut app = with_list("Aisle 4");
        type_str(&mut app, "614141000036");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::Details);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.editable_fields(), vec![Field::Qty]);
        assert_eq!(form.brand, "Acme");

        app.handle_key(key(KeyCode::Backspace)).unwrap();
        type_str(&mut app, "4");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::ScanCode);
        let list = app.list.as_ref().unwrap();
        assert_eq!(list.get("0061414100003").unwrap().qty, 4);
    }

    #[test]
    fn test_unknown_item_takes_manual_details() {
        let mut app = with_list("Backroom");
        type_str(&mut app, "4006381333931");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.form.as_ref().unwrap().focus, Field::Brand);
        type_str(&mut app, "Stabilo");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_str(&mut app, "Highlighter");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_str(&mut app, "1.25");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let line = app.list.as_ref().unwrap().get("4006381333931").unwrap().clone();
        assert_eq!(line.brand, "Stabilo");
        assert_eq!(line.price, Price::from_cents(125));
        assert_eq!(line.qty, 1);
    }

    #[test]
    fn test_bad_quantity_keeps_form_open() {
        let mut app = with_list("Aisle 4");
        type_str(&mut app, "614141000036");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Backspace)).unwrap();
        type_str(&mut app, "0");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::Details);
        assert!(app.status.contains("non-zero"));
    }

    #[test]
    fn test_out_of_range_entries_keep_form_open() {
        let mut app = with_list("Backroom");
        type_str(&mut app, "4006381333931");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        // Brand -> Description -> Price
        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_str(&mut app, "1000000");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.mode, Mode::Details);
        assert!(app.status.contains("999999.99"));

        app.form.as_mut().unwrap().price = "1.25".to_string();
        app.form.as_mut().unwrap().qty = "100000000000000000".to_string();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.mode, Mode::Details);
        assert!(app.status.contains("outside"));
        assert!(app.list.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_empty_code_reports_error() {
        let mut app = with_list("Aisle 4");
        type_str(&mut app, "abc");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::ScanCode);
        assert!(app.status.contains("no digits"));
    }

    #[test]
    fn test_scale_label_price_locked_and_adjustable() {
        let mut app = with_list("Deli");
        type_str(&mut app, "27088050707");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let form = app.form.as_ref().unwrap();
        assert_eq!(form.price, "7.07");
        assert!(!form.editable_fields().contains(&Field::Price));

        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.mode, Mode::Browse);

        app.handle_key(key(KeyCode::Char('+'))).unwrap();
        let list = app.list.as_ref().unwrap();
        assert_eq!(list.get("2708805000000-0707-1").unwrap().qty, 2);
    }
}
