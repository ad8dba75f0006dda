//! Gridsift - A fast TUI for filtering, sorting and paging tabular data
//!
//! Loads CSV, TSV or JSON Lines into memory and presents it as an
//! interactive table. With `--print` or `--output` it runs headless and
//! writes the resulting view as CSV instead.

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use gridsift::app::{App, InputMode};
use gridsift::commands::TableCommand;
use gridsift::data::Dataset;
use gridsift::debounce::DEFAULT_DEBOUNCE;
use gridsift::export;
use gridsift::filter::FilterPredicate;
use gridsift::format::{self, InputFormat};
use gridsift::paginate::PageSize;
use gridsift::sort::SortKey;
use gridsift::table::{Table, TableState};
use gridsift::tui::Tui;
use gridsift::ui;

/// Gridsift - filter, sort and page through tabular data
#[derive(FromArgs)]
struct Args {
    /// path to a CSV, TSV or JSONL file (`-` reads stdin)
    #[argh(positional)]
    file: String,

    /// input format: csv, tsv or jsonl (default: from the file extension)
    #[argh(option)]
    format: Option<String>,

    /// rows per page: a number or `all` (default: 10)
    #[argh(option, short = 'n')]
    page_size: Option<String>,

    /// quiet period before a typed filter applies, in milliseconds (default: 500)
    #[argh(option)]
    debounce_ms: Option<u64>,

    /// write logs to this file
    #[argh(option)]
    log_file: Option<String>,

    /// text that must appear in some cell of every row
    #[argh(option, short = 'g')]
    global: Option<String>,

    /// column substring filter as `column=text` (repeatable)
    #[argh(option, short = 'f')]
    filter: Vec<String>,

    /// numeric range filter as `column=min..max`, either bound may be empty (repeatable)
    #[argh(option, short = 'r')]
    range: Vec<String>,

    /// sort key as `column` or `column:desc`, in priority order (repeatable)
    #[argh(option, short = 's')]
    sort: Vec<String>,

    /// zero-based page to show (out-of-range pages clamp)
    #[argh(option, short = 'p')]
    page: Option<usize>,

    /// headless: print the current page as CSV to stdout
    #[argh(switch)]
    print: bool,

    /// headless: write every filtered and sorted row as CSV to this path
    #[argh(option, short = 'o')]
    output: Option<String>,

    /// print the table state as JSON to stderr
    #[argh(switch)]
    state: bool,
}

impl Args {
    fn headless(&self) -> bool {
        self.print || self.output.is_some()
    }

    /// Intents that reproduce the command-line view, in application order
    fn commands(&self) -> Result<Vec<TableCommand>> {
        let mut commands = Vec::new();

        if let Some(ref size) = self.page_size {
            match PageSize::parse(size) {
                Some(size) => commands.push(TableCommand::SetPageSize(size)),
                None => bail!("Invalid page size {:?}: expected a positive number or `all`", size),
            }
        }
        if let Some(ref global) = self.global {
            commands.push(TableCommand::SetGlobalFilter(global.clone()));
        }
        for filter in &self.filter {
            let (column, text) = split_assignment(filter, "--filter")?;
            commands.push(TableCommand::SetColumnFilter {
                column: column.to_string(),
                predicate: FilterPredicate::Text(text.to_string()),
            });
        }
        for range in &self.range {
            let (column, bounds) = split_assignment(range, "--range")?;
            commands.push(TableCommand::SetColumnFilter {
                column: column.to_string(),
                predicate: FilterPredicate::parse_range(bounds),
            });
        }
        if !self.sort.is_empty() {
            let keys = self.sort.iter().map(|s| SortKey::parse(s)).collect();
            commands.push(TableCommand::SetSort(keys));
        }
        if let Some(page) = self.page {
            commands.push(TableCommand::SetPageIndex(page));
        }

        Ok(commands)
    }

    /// Initial table state from the command line
    fn table_state(&self) -> Result<TableState> {
        Ok(self
            .commands()?
            .iter()
            .fold(TableState::default(), |state, command| state.apply(command)))
    }
}

/// Split `column=value`
fn split_assignment<'a>(arg: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    match arg.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column, value)),
        _ => bail!("Invalid {} {:?}: expected column=value", flag, arg),
    }
}

/// Install the tracing subscriber.
///
/// The TUI owns the terminal, so without `--log-file` nothing is logged there.
fn init_logging(log_file: Option<&str>, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path))?;
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).init();
    } else if headless {
        let console_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_filter(filter);
        tracing_subscriber::registry().with(console_layer).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.log_file.as_deref(), args.headless())?;

    let input_format = match args.format {
        Some(ref f) => match InputFormat::parse(f) {
            Some(format) => Some(format),
            None => bail!("Unknown format {:?}: expected csv, tsv or jsonl", f),
        },
        None => None,
    };
    let state = args.table_state()?;

    // Load the dataset - support stdin with "-"
    if args.file == "-" {
        eprintln!("📂 Reading from stdin...");
    } else {
        eprintln!("📂 Opening {}...", args.file);
    }
    let dataset = format::load_dataset(&args.file, input_format)
        .with_context(|| format!("Failed to load dataset: {}", args.file))?;
    eprintln!(
        "✓ Loaded {} rows x {} columns",
        dataset.len(),
        dataset.columns().len()
    );
    info!(
        "Loaded {:?}: {} rows, {} columns (v{})",
        dataset.source,
        dataset.len(),
        dataset.columns().len(),
        dataset.version()
    );

    if args.headless() {
        return run_headless(&args, dataset, state);
    }

    let debounce = args
        .debounce_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DEBOUNCE);
    let mut app = App::new(Table::with_state(dataset, state), debounce);

    run_tui(&mut app)?;

    if args.state {
        eprintln!("{}", app.state_json());
    }
    eprintln!("👋 Goodbye!");
    Ok(())
}

/// Headless mode: no TUI, views are written as CSV
fn run_headless(args: &Args, dataset: Dataset, state: TableState) -> Result<()> {
    let table = Table::with_state(dataset, state);
    eprintln!(
        "🔍 {} of {} rows match, page {}/{}",
        table.filtered_len(),
        table.total_len(),
        table.page_index() + 1,
        table.page_count()
    );

    if args.print {
        let stdout = io::stdout();
        export::write_csv(stdout.lock(), table.columns(), &table.page_rows())
            .with_context(|| "Failed to print page")?;
    }

    if let Some(ref path) = args.output {
        let rows = table.filtered_rows();
        export::export_to_file(path, table.columns(), &rows)?;
        eprintln!("✅ Wrote {} rows to {}", rows.len(), path);
    }

    if args.state {
        let json = serde_json::to_string_pretty(&table.snapshot())?;
        eprintln!("{}", json);
    }

    Ok(())
}

/// Interactive mode
fn run_tui(app: &mut App) -> Result<()> {
    let mut tui = Tui::new()?;

    // Main event loop
    loop {
        app.drain_commands();
        tui.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.mode {
                        InputMode::Normal => handle_normal_key(app, key),
                        InputMode::Global | InputMode::Column(_) => handle_edit_key(app, key),
                    }
                }
            }
            // Resize is handled by ratatui on the next draw
        }

        if app.should_quit {
            break;
        }
    }

    // Cleanup
    tui.restore()
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    // Popups close on any key
    if app.show_help || app.show_state {
        app.show_help = false;
        app.show_state = false;
        return;
    }
    app.status = None;

    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
            app.should_quit = true;
        }
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => app.cursor_down(1),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => app.cursor_up(1),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => app.column_left(),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => app.column_right(),
        (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => app.next_page(),
        (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => app.prev_page(),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => app.first_page(),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => app.last_page(),
        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => app.cycle_page_size(true),
        (KeyCode::Char('-'), _) => app.cycle_page_size(false),

        // Filtering and sorting
        (KeyCode::Char('/'), _) => app.begin_global_edit(),
        (KeyCode::Char('f'), _) => app.begin_column_edit(),
        (KeyCode::Char('x'), _) => app.clear_filters(),
        (KeyCode::Char('s'), _) => app.toggle_sort(false),
        (KeyCode::Char('S'), _) => app.toggle_sort(true),

        // Selection
        (KeyCode::Char(' '), _) => app.toggle_row(),
        (KeyCode::Char('a'), _) => app.toggle_page_selection(),
        (KeyCode::Char('A'), _) => app.toggle_filtered_selection(),
        (KeyCode::Char('c'), _) => app.clear_selection(),
        (KeyCode::Char('e'), _) => app.export(),

        // Popups
        (KeyCode::Char('i'), _) => app.show_state = true,
        (KeyCode::Char('?'), _) => app.show_help = true,

        _ => {}
    }
}

fn handle_edit_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.edit_commit(),
        KeyCode::Esc => app.edit_cancel(),
        KeyCode::Backspace => app.edit_backspace(),
        KeyCode::Tab => app.cycle_suggestion(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.edit_push(c),
        _ => {}
    }
}
