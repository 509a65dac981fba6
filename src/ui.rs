use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use inventario::db::Equipo;
use inventario::stats::{CategoryAggregator, CategoryTally};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Catalogo,
    Estadisticas,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Catalogo => Page::Estadisticas,
            Page::Estadisticas => Page::Catalogo,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Catalogo => "Catálogo",
            Page::Estadisticas => "Estadísticas",
        }
    }
}

pub struct App {
    pub equipos: Vec<Equipo>,
    pub filtered: Vec<Equipo>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub category_filter: Option<String>,
    tally: CategoryTally,
}

impl App {
    pub fn new(equipos: Vec<Equipo>) -> Self {
        let mut state = TableState::default();
        if !equipos.is_empty() {
            state.select(Some(0));
        }

        let mut aggregator = CategoryAggregator::new();
        let tally = aggregator.recompute(&equipos);
        let filtered = equipos.clone();

        Self {
            equipos,
            filtered,
            state,
            current_page: Page::Catalogo,
            show_detail: false,
            category_filter: None,
            tally,
        }
    }

    pub fn tally(&self) -> &CategoryTally {
        &self.tally
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_equipo(&self) -> Option<&Equipo> {
        self.state.selected().and_then(|i| self.filtered.get(i))
    }

    pub fn apply_filter(&mut self, categoria: Option<String>) {
        self.filtered = match &categoria {
            None => self.equipos.clone(),
            Some(cat) => self
                .equipos
                .iter()
                .filter(|e| &e.categoria == cat)
                .cloned()
                .collect(),
        };
        self.category_filter = categoria;

        // Reset selection to first item
        if !self.filtered.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    /// Filter by the Nth category of the current tally (stats page hotkeys)
    pub fn filter_by_tally_index(&mut self, index: usize) {
        if let Some(label) = self.tally.labels.get(index).cloned() {
            self.apply_filter(Some(label));
            self.current_page = Page::Catalogo;
        }
    }

    pub fn next(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Char('c') => {
                    app.apply_filter(None);
                    app.current_page = Page::Catalogo;
                }
                KeyCode::Char(d @ '1'..='9') if app.current_page == Page::Estadisticas => {
                    let index = d as usize - '1' as usize;
                    app.filter_by_tally_index(index);
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.filtered.is_empty() {
                        app.state.select(Some(app.filtered.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Catalogo {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Record list
                Constraint::Percentage(40), // Detail panel
            ])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Catalogo => render_table(f, chunks[1], app),
            Page::Estadisticas => render_estadisticas(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Catalogo, Page::Estadisticas];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Equipos: {}", app.equipos.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Categorías: {}", app.tally().labels.len()),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Modelo", "Categoría", "Estado", "N° Serie", "Registrado"]
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

    let rows = app.filtered.iter().map(|equipo| {
        let category_color = app
            .tally
            .color_for(&equipo.categoria)
            .and_then(hex_to_color)
            .unwrap_or(Color::White);

        let cells = vec![
            Cell::from(truncate(&equipo.modelo, 28)),
            Cell::from(truncate(&equipo.categoria, 18))
                .style(Style::default().fg(category_color)),
            Cell::from(equipo.estado.clone()),
            Cell::from(equipo.numero_serie.clone()),
            Cell::from(equipo.fecha_registro.format("%Y-%m-%d").to_string()),
        ];

        Row::new(cells).height(1)
    });

    let title = match &app.category_filter {
        Some(cat) => format!(" Equipos - {} ", cat),
        None => " Equipos ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(16),
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

fn render_estadisticas(f: &mut Frame, area: Rect, app: &App) {
    let tally = app.tally();

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Equipos por Categoría",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    if tally.is_empty() {
        content.push(Line::from(vec![Span::styled(
            "  Sin datos: no hay equipos registrados con categoría.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]));
    } else {
        for (i, label) in tally.labels.iter().enumerate() {
            let color = tally
                .color_for(label)
                .and_then(hex_to_color)
                .unwrap_or(Color::White);

            content.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(". "),
                Span::styled("■ ", Style::default().fg(color)),
                Span::styled(
                    format!(
                        "{}: {} equipos ({:.1}%)",
                        label,
                        tally.counts[i],
                        tally.percentage(i).unwrap_or(0.0)
                    ),
                    Style::default().fg(Color::White),
                ),
            ]));
        }

        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("Total: {} equipos", tally.total()),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(
                "  Pista: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "pulsa 1-9 para filtrar el catálogo por categoría, c para limpiar",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Estadísticas por Categoría "),
    );

    f.render_widget(paragraph, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let equipo = match app.selected_equipo() {
        Some(e) => e,
        None => {
            let no_selection = Paragraph::new("Ningún equipo seleccionado").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Detalle del Equipo "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Modelo: ", label_style),
            Span::raw(&equipo.modelo),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Descripción: ", label_style),
            Span::raw(&equipo.descripcion),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  N° Serie: ", label_style),
            Span::raw(&equipo.numero_serie),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Estado: ", label_style),
            Span::raw(&equipo.estado),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Categoría: ", label_style),
            Span::styled(
                &equipo.categoria,
                Style::default().fg(
                    app.tally
                        .color_for(&equipo.categoria)
                        .and_then(hex_to_color)
                        .unwrap_or(Color::White),
                ),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Imagen: ", label_style),
            Span::styled(
                equipo.imagen.as_deref().unwrap_or("(sin imagen)"),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Registrado: ", label_style),
            Span::raw(equipo.fecha_registro.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Detalle del Equipo "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered.len();

    let mut status_spans = vec![Span::styled(
        format!(" Fila: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(cat) = &app.category_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filtro: {}", cat),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" limpiar)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Detalle | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Página | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Navegar | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Salir"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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

fn hex_to_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_color_parses_palette_entries() {
        assert_eq!(hex_to_color("#FF6384"), Some(Color::Rgb(0xFF, 0x63, 0x84)));
        assert_eq!(hex_to_color("#36A2EB"), Some(Color::Rgb(0x36, 0xA2, 0xEB)));
    }

    #[test]
    fn test_hex_to_color_rejects_malformed_input() {
        assert_eq!(hex_to_color("FF6384"), None); // missing '#'
        assert_eq!(hex_to_color("#FFF"), None);
        assert_eq!(hex_to_color("#GGGGGG"), None);
        // 6 bytes with a char boundary mid-slice; must not panic
        assert_eq!(hex_to_color("#aééb"), None);
    }
}
