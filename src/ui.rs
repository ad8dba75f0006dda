//! Gridsift - UI rendering
//!
//! Renders the main interface using Ratatui widgets.

use crate::app::{App, InputMode};
use crate::schema::ColumnKind;
use crate::selection::SelectAllState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap,
    },
    Frame,
};

/// Suggestions drawn under a column filter at once
const VISIBLE_SUGGESTIONS: usize = 8;

/// Theme colors for the UI
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub error: Color,
    pub warning: Color,
    pub border: Color,
    pub highlight: Color,
    pub muted: Color,
    pub selected: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Dracula-inspired dark theme
        Self {
            bg: Color::Rgb(40, 42, 54),
            fg: Color::Rgb(248, 248, 242),
            accent: Color::Rgb(139, 233, 253),
            error: Color::Rgb(255, 85, 85),
            warning: Color::Rgb(255, 184, 108),
            border: Color::Rgb(98, 114, 164),
            highlight: Color::Rgb(68, 71, 90),
            muted: Color::Rgb(98, 114, 164),
            selected: Color::Rgb(80, 250, 123),
        }
    }
}

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let theme = Theme::default();

    // search bar, table, page footer, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_search_bar(frame, app, chunks[0], &theme);
    render_table(frame, app, chunks[1], &theme);
    render_page_footer(frame, app, chunks[2], &theme);
    render_status_bar(frame, app, chunks[3], &theme);

    if let InputMode::Column(index) = app.mode {
        render_suggestions(frame, app, chunks[1], index, &theme);
    }
    if app.show_state {
        render_state_popup(frame, app, &theme);
    }
    if app.show_help {
        render_help_popup(frame, &theme);
    }
}

/// Global search input
fn render_search_bar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let editing = app.mode == InputMode::Global;
    let text = if editing {
        format!("{}▏", app.input)
    } else {
        app.table.state().global_filter.clone()
    };

    let line = if text.is_empty() {
        Line::from(Span::styled(
            "Search all columns... (/)",
            Style::default().fg(theme.muted),
        ))
    } else {
        Line::from(Span::styled(text, Style::default().fg(theme.fg)))
    };

    let border = if editing { theme.accent } else { theme.border };
    let bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(" Search ", Style::default().fg(theme.accent)))
            .style(Style::default().bg(theme.bg)),
    );
    frame.render_widget(bar, area);
}

/// Filter hint or current filter text for each column
fn filter_labels(app: &mut App) -> Vec<String> {
    let columns = app.table.columns().to_vec();
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            if app.mode == InputMode::Column(i) {
                return format!("{}▏", app.input);
            }
            if let Some(predicate) = app.table.state().column_filter(&column.name) {
                return predicate.display();
            }
            let facets = app.table.facets(&column.name);
            match column.kind {
                ColumnKind::Numeric => {
                    let min = facets.min.map(|n| format!(" ({})", n)).unwrap_or_default();
                    let max = facets.max.map(|n| format!(" ({})", n)).unwrap_or_default();
                    format!("Min{} / Max{}", min, max)
                }
                ColumnKind::Text => format!("Search... ({})", facets.unique_count()),
            }
        })
        .collect()
}

/// Render the data table for the current page
fn render_table(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let labels = filter_labels(app);
    let table = &app.table;

    let select_all = table.filtered_select_state();
    let mut header_cells = vec![Cell::from(Text::from(vec![
        Line::from(select_all.glyph()),
        Line::from(""),
    ]))];
    for (i, column) in table.columns().iter().enumerate() {
        let arrow = table
            .sort_direction(&column.name)
            .map(|d| format!(" {}", d.arrow()))
            .unwrap_or_default();
        let name_style = if i == app.column {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        };
        let filter_style = if table.state().column_filter(&column.name).is_some()
            || app.mode == InputMode::Column(i)
        {
            Style::default().fg(theme.warning)
        } else {
            Style::default().fg(theme.muted)
        };
        header_cells.push(Cell::from(Text::from(vec![
            Line::from(Span::styled(format!("{}{}", column.name, arrow), name_style)),
            Line::from(Span::styled(labels[i].clone(), filter_style)),
        ])));
    }
    let header = Row::new(header_cells).height(2);

    let rows: Vec<Row> = table
        .page_rows()
        .into_iter()
        .map(|row| {
            let selected = table.selection().is_selected(row.id());
            let mut cells = vec![Cell::from(Span::styled(
                if selected { "[x]" } else { "[ ]" },
                Style::default().fg(if selected { theme.selected } else { theme.muted }),
            ))];
            cells.extend((0..table.columns().len()).map(|i| match row.cell(i) {
                Some(value) => Cell::from(value.to_string()),
                None => Cell::from(Span::styled("∅", Style::default().fg(theme.muted))),
            }));
            let style = if selected {
                Style::default().fg(theme.selected)
            } else {
                Style::default().fg(theme.fg)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let mut widths = vec![Constraint::Length(3)];
    widths.extend(table.columns().iter().map(|_| Constraint::Fill(1)));

    let title = format!(
        " Gridsift │ {} │ {} of {} rows ",
        table
            .dataset()
            .source
            .split('/')
            .next_back()
            .filter(|s| !s.is_empty())
            .unwrap_or("data"),
        table.filtered_len(),
        table.total_len(),
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .row_highlight_style(Style::default().bg(theme.highlight))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(Span::styled(title, Style::default().fg(theme.accent)))
                .style(Style::default().bg(theme.bg)),
        );

    let mut state = TableState::default();
    if !table.page_ids().is_empty() {
        state.select(Some(app.cursor));
    }
    frame.render_stateful_widget(widget, area, &mut state);

    if table.columns().is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No data loaded",
            Style::default().fg(theme.muted),
        ));
        let inner = Rect {
            x: area.x + 2,
            y: area.y + 2,
            width: area.width.saturating_sub(4),
            height: 1.min(area.height),
        };
        frame.render_widget(empty, inner);
    }
}

/// Page-level select-all checkbox and page position
fn render_page_footer(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let table = &app.table;
    let page_state = table.page_select_state();
    let glyph_style = match page_state {
        SelectAllState::Unchecked => Style::default().fg(theme.muted),
        _ => Style::default().fg(theme.selected),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", page_state.glyph()), glyph_style),
        Span::styled(
            format!("Page Rows ({})", table.page_ids().len()),
            Style::default().fg(theme.fg),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let table = &app.table;
    let filters = table.state().column_filters.len()
        + usize::from(!table.state().global_filter.is_empty());

    let mut spans = vec![
        Span::styled(
            concat!(" Gridsift v", env!("CARGO_PKG_VERSION"), " "),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("|", Style::default().fg(theme.border)),
        Span::styled(
            format!(" {}/{} rows ", table.filtered_len(), table.total_len()),
            Style::default().fg(theme.fg),
        ),
        Span::styled("|", Style::default().fg(theme.border)),
        Span::styled(
            format!(" Page {}/{} ", table.page_index() + 1, table.page_count()),
            Style::default().fg(theme.fg),
        ),
        Span::styled("|", Style::default().fg(theme.border)),
        Span::styled(
            format!(" {} per page ", table.page_size().label()),
            Style::default().fg(theme.muted),
        ),
        Span::styled("|", Style::default().fg(theme.border)),
        Span::styled(
            format!(" {} filters ", filters),
            Style::default().fg(if filters > 0 { theme.warning } else { theme.muted }),
        ),
        Span::styled("|", Style::default().fg(theme.border)),
        Span::styled(
            format!(" {} selected ", table.selection().len()),
            Style::default().fg(theme.selected),
        ),
    ];

    if let Some(ref status) = app.status {
        spans.push(Span::styled("|", Style::default().fg(theme.border)));
        let color = if status.starts_with("Export failed") {
            theme.error
        } else {
            theme.fg
        };
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(color)));
    }

    spans.push(Span::styled("|", Style::default().fg(theme.border)));
    spans.push(Span::styled(" ?:Help q:Quit ", Style::default().fg(theme.muted)));

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.bg)),
    );

    frame.render_widget(status_bar, area);
}

/// Value suggestions under the column being edited
fn render_suggestions(frame: &mut Frame, app: &mut App, area: Rect, index: usize, theme: &Theme) {
    let suggestions = app.suggestions();
    if suggestions.is_empty() {
        return;
    }
    let current = app.suggestion.as_ref().map(|(_, i)| *i);
    let start = current
        .map(|i| i.saturating_sub(VISIBLE_SUGGESTIONS - 1))
        .unwrap_or(0);

    let items: Vec<ListItem> = suggestions
        .iter()
        .enumerate()
        .skip(start)
        .take(VISIBLE_SUGGESTIONS)
        .map(|(i, value)| {
            let style = if Some(i) == current {
                Style::default().bg(theme.highlight).fg(theme.accent)
            } else {
                Style::default().fg(theme.fg)
            };
            ListItem::new(value.clone()).style(style)
        })
        .collect();

    // align roughly under the edited column
    let columns = app.table.columns().len().max(1) as u16;
    let usable = area.width.saturating_sub(7);
    let x = area.x + 6 + usable / columns * index as u16;
    let width = 30.min(area.width.saturating_sub(x.saturating_sub(area.x)));
    let height = (items.len() as u16 + 2).min(area.height.saturating_sub(3));
    let popup = Rect {
        x,
        y: area.y + 3,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(Span::styled(
                format!(" {} values (Tab) ", suggestions.len()),
                Style::default().fg(theme.muted),
            ))
            .style(Style::default().bg(theme.bg)),
    );
    frame.render_widget(list, popup);
}

/// Render the state inspector
fn render_state_popup(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let json = app.state_json();
    let lines: Vec<Line> = json.lines().map(|line| highlight_json(line, theme)).collect();

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(" Table State ", Style::default().fg(theme.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn key_line(key: &'static str, action: &'static str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), Style::default().fg(color)),
        Span::raw(action),
    ])
}

fn section(title: &'static str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Render help popup
fn render_help_popup(frame: &mut Frame, theme: &Theme) {
    let area = centered_rect(55, 85, frame.area());

    // Clear the background
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Navigation", theme.warning),
        key_line("j / k", "Move cursor down / up", theme.warning),
        key_line("h / l", "Focus previous / next column", theme.warning),
        key_line("n / p", "Next / previous page", theme.warning),
        key_line("g / G", "First / last page", theme.warning),
        key_line("+ / -", "Cycle rows per page (5, 10, 25, All)", theme.warning),
        Line::from(""),
        section("Filtering & Sorting", theme.accent),
        key_line("/", "Search all columns", theme.accent),
        key_line("f", "Filter focused column (numbers: min..max)", theme.accent),
        key_line("Tab", "Cycle value suggestions while filtering", theme.accent),
        key_line("Enter/Esc", "Apply now / discard edit", theme.accent),
        key_line("s / S", "Sort focused column / add to sort", theme.accent),
        key_line("x", "Clear all filters", theme.accent),
        Line::from(""),
        section("Selection", theme.selected),
        key_line("Space", "Toggle row", theme.selected),
        key_line("a", "Toggle all rows on page", theme.selected),
        key_line("A", "Toggle all filtered rows", theme.selected),
        key_line("c", "Clear selection", theme.selected),
        key_line("e", "Export selected (or filtered) rows", theme.selected),
        Line::from(""),
        key_line("i", "Toggle state inspector", theme.muted),
        key_line("?", "Toggle this help", theme.muted),
        key_line("q", "Quit", theme.error),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" Help ", Style::default().fg(theme.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, area);
}

/// Basic JSON syntax highlighting
fn highlight_json(text: &str, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current = String::new();
    let mut is_key = true;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }

                let mut string_content = String::from('"');
                let mut escaped = false;
                for ch in chars.by_ref() {
                    string_content.push(ch);
                    if ch == '"' && !escaped {
                        break;
                    }
                    escaped = ch == '\\' && !escaped;
                }

                // a key is followed by ':' on the same line
                let color = if is_key && chars.peek() == Some(&':') {
                    theme.accent
                } else {
                    Color::Rgb(241, 250, 140) // Yellow for values
                };
                spans.push(Span::styled(string_content, Style::default().fg(color)));
            }
            ':' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }
                spans.push(Span::styled(":", Style::default().fg(theme.fg)));
                is_key = false;
            }
            ',' | '{' | '}' | '[' | ']' => {
                if !current.is_empty() {
                    let color = scalar_color(&current, theme);
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        Style::default().fg(color),
                    ));
                }
                let color = if c == ',' { theme.fg } else { theme.warning };
                spans.push(Span::styled(c.to_string(), Style::default().fg(color)));
                is_key = c != '[';
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        let color = scalar_color(&current, theme);
        spans.push(Span::styled(current, Style::default().fg(color)));
    }

    Line::from(spans)
}

fn scalar_color(text: &str, theme: &Theme) -> Color {
    let trimmed = text.trim();
    if trimmed.parse::<f64>().is_ok() {
        Color::Rgb(189, 147, 249) // Purple for numbers
    } else if trimmed == "true" || trimmed == "false" || trimmed == "null" {
        Color::Rgb(255, 121, 198) // Pink for literals
    } else {
        theme.fg
    }
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::table::Table as DataTable;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn buffer_text(terminal: &ratatui::Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_render_page_and_hints() {
        let ds = Dataset::from_records(vec![
            vec!["name".into(), "age".into()],
            vec!["Alice".into(), "30".into()],
            vec!["Bob".into(), "25".into()],
        ])
        .with_source("people.csv");
        let mut app = App::new(DataTable::new(ds), Duration::from_millis(500));
        app.toggle_sort(false);

        let mut terminal = ratatui::Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);

        assert!(text.contains("people.csv"));
        assert!(text.contains("name ▲"));
        assert!(text.contains("Search... (2)"));
        assert!(text.contains("Min (25) / Max (30)"));
        assert!(text.contains("Alice"));
        assert!(text.contains("Page Rows (2)"));
        assert!(text.contains("Page 1/1"));
    }

    #[tokio::test]
    async fn test_render_empty_dataset() {
        let mut app = App::new(DataTable::default(), Duration::from_millis(500));
        let mut terminal = ratatui::Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("0 of 0 rows"));
        assert!(text.contains("0/0 rows"));
        assert!(text.contains("No data loaded"));

        app.show_help = true;
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Keyboard Shortcuts"));
    }
}
