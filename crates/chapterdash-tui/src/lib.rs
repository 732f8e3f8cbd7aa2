// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use chapterdash_app::{
    AppCommand, AppEvent, AppMode, AppState, BulkFixState, ChapterLoad, ChapterPath,
    ChapterRecord, ChapterStatus, FixControl, RemoteRequest, StatusFilter,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const PAGE_ROWS: usize = 10;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const COVER_MARK: &str = "▣";
const LINK_ARROW: &str = "↗";
const PLACEHOLDER_LINK: &str = "#";
const COLUMNS: [&str; 11] = [
    "",
    "title",
    "alt titles",
    "file",
    "vol",
    "ch",
    "comicinfo",
    "official",
    "modified",
    "",
    "fix",
];

/// Remote side of the dashboard. `spawn_request` must eventually send exactly
/// one `InternalEvent::Remote` for every request it accepts; the default runs
/// the call inline, real runtimes move it to a worker thread.
pub trait DashboardRuntime {
    fn fetch_chapters(&mut self) -> Result<Vec<ChapterRecord>>;
    fn fix_chapter(&mut self, path: &ChapterPath) -> Result<()>;
    fn fix_all(&mut self) -> Result<()>;
    fn spawn_request(&mut self, request: RemoteRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let completion = perform_request(self, request);
        tx.send(InternalEvent::Remote(completion))
            .map_err(|_| anyhow!("remote event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCompletion {
    Chapters {
        request_id: u64,
        result: Result<ChapterLoad, String>,
    },
    Fix {
        path: ChapterPath,
        result: Result<(), String>,
    },
    FixAll {
        result: Result<(), String>,
    },
}

impl RemoteCompletion {
    pub fn failed(request: RemoteRequest, error: &anyhow::Error) -> Self {
        let message = format!("{error:#}");
        match request {
            RemoteRequest::FetchChapters { request_id } => Self::Chapters {
                request_id,
                result: Err(message),
            },
            RemoteRequest::FixChapter { path } => Self::Fix {
                path,
                result: Err(message),
            },
            RemoteRequest::FixAll => Self::FixAll {
                result: Err(message),
            },
        }
    }

    pub fn into_command(self) -> AppCommand {
        match self {
            Self::Chapters { request_id, result } => {
                AppCommand::RefreshSettled { request_id, result }
            }
            Self::Fix { path, result } => AppCommand::FixSettled { path, result },
            Self::FixAll { result } => AppCommand::FixAllSettled { result },
        }
    }
}

/// Runs one request against the runtime and packages the outcome. Errors are
/// flattened to strings so completions can cross threads.
pub fn perform_request<R: DashboardRuntime + ?Sized>(
    runtime: &mut R,
    request: RemoteRequest,
) -> RemoteCompletion {
    match request {
        RemoteRequest::FetchChapters { request_id } => RemoteCompletion::Chapters {
            request_id,
            result: runtime
                .fetch_chapters()
                .map(|records| ChapterLoad {
                    records,
                    loaded_at: OffsetDateTime::now_utc(),
                })
                .map_err(|error| format!("{error:#}")),
        },
        RemoteRequest::FixChapter { path } => {
            let result = runtime
                .fix_chapter(&path)
                .map_err(|error| format!("{error:#}"));
            RemoteCompletion::Fix { path, result }
        }
        RemoteRequest::FixAll => RemoteCompletion::FixAll {
            result: runtime.fix_all().map_err(|error| format!("{error:#}")),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Remote(RemoteCompletion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub service_label: String,
    pub utc_offset: UtcOffset,
    pub show_detail: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            service_label: String::new(),
            utc_offset: UtcOffset::UTC,
            show_detail: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    options: ViewOptions,
    selected_row: usize,
    selected_path: Option<ChapterPath>,
    help_visible: bool,
    bulk_overlay_hidden: bool,
    status_token: u64,
    spinner_tick: usize,
}

impl ViewData {
    fn new(options: ViewOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_tick % SPINNER.len()]
    }
}

/// One rendered table row. Built fresh from the filter output on every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChapterRow {
    path: ChapterPath,
    has_cover: bool,
    cover_url: String,
    title: String,
    link: String,
    alt_titles: Vec<String>,
    filename: String,
    volume: String,
    chapter: String,
    comicinfo_date: String,
    official_date: String,
    file_mod_date: String,
    status: ChapterStatus,
    control: FixControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableProjection {
    rows: Vec<ChapterRow>,
    fixable_count: usize,
}

pub fn run_app<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: ViewOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    apply_command(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        AppCommand::Refresh,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);
        view_data.spinner_tick = view_data.spinner_tick.wrapping_add(1);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Remote(completion) => {
                apply_command(state, runtime, view_data, tx, completion.into_command());
            }
        }
    }
}

fn apply_command<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    for event in events {
        match event {
            AppEvent::RequestIssued(request) => {
                debug!("issuing {request:?}");
                if let Err(error) = runtime.spawn_request(request.clone(), tx.clone()) {
                    warn!("could not start {request:?}: {error:#}");
                    let completion = RemoteCompletion::failed(request, &error);
                    apply_command(state, runtime, view_data, tx, completion.into_command());
                }
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            AppEvent::FaultRaised(fault) => {
                warn!("{}", fault.summary());
            }
            AppEvent::BulkFixChanged(_) => {
                view_data.bulk_overlay_hidden = false;
            }
            AppEvent::ChaptersReplaced { .. }
            | AppEvent::SearchChanged(_)
            | AppEvent::StatusFilterChanged(_) => {
                restore_selection(state, view_data);
            }
            AppEvent::ModeChanged(_)
            | AppEvent::FixControlChanged { .. }
            | AppEvent::FaultCleared
            | AppEvent::StatusCleared => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    apply_command(
        state,
        runtime,
        view_data,
        tx,
        AppCommand::SetStatus(message.into()),
    );
}

/// Keeps the cursor on the same chapter across refreshes and filter edits
/// when it is still visible, otherwise clamps it.
fn restore_selection(state: &AppState, view_data: &mut ViewData) {
    let outcome = state.visible();
    let len = outcome.visible.len();
    if len == 0 {
        view_data.selected_row = 0;
        view_data.selected_path = None;
        return;
    }

    if let Some(path) = &view_data.selected_path
        && let Some(index) = outcome
            .visible
            .iter()
            .position(|record| &record.path == path)
    {
        view_data.selected_row = index;
        return;
    }

    view_data.selected_row = view_data.selected_row.min(len - 1);
    view_data.selected_path = Some(outcome.visible[view_data.selected_row].path.clone());
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let outcome = state.visible();
    let len = outcome.visible.len();
    if len == 0 {
        view_data.selected_row = 0;
        view_data.selected_path = None;
        return;
    }
    let next = (view_data.selected_row as isize + delta).clamp(0, len as isize - 1) as usize;
    view_data.selected_row = next;
    view_data.selected_path = Some(outcome.visible[next].path.clone());
}

fn selected_record<'a>(state: &'a AppState, view_data: &ViewData) -> Option<&'a ChapterRecord> {
    state.visible().visible.get(view_data.selected_row).copied()
}

fn handle_key_event<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return true;
    }

    if bulk_overlay_visible(state, view_data) {
        handle_bulk_overlay_key(state, runtime, view_data, tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.mode == AppMode::Search {
        let command = match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(AppCommand::ExitSearch),
            KeyCode::Backspace => Some(AppCommand::PopSearchChar),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppCommand::ClearSearch)
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppCommand::PushSearchChar(ch))
            }
            _ => None,
        };
        if let Some(command) = command {
            apply_command(state, runtime, view_data, tx, command);
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => move_selection(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(state, view_data, -1),
        KeyCode::PageDown => move_selection(state, view_data, PAGE_ROWS as isize),
        KeyCode::PageUp => move_selection(state, view_data, -(PAGE_ROWS as isize)),
        KeyCode::Char('g') | KeyCode::Home => move_selection(state, view_data, isize::MIN / 2),
        KeyCode::Char('G') | KeyCode::End => move_selection(state, view_data, isize::MAX / 2),
        KeyCode::Char('/') => apply_command(state, runtime, view_data, tx, AppCommand::EnterSearch),
        KeyCode::Char('s') => {
            apply_command(state, runtime, view_data, tx, AppCommand::NextStatusFilter);
        }
        KeyCode::Char('S') => {
            apply_command(state, runtime, view_data, tx, AppCommand::PrevStatusFilter);
        }
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit as usize - '1' as usize;
            apply_command(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::SetStatusFilter(StatusFilter::ALL[index]),
            );
        }
        KeyCode::Char('f') | KeyCode::Enter => activate_selected(state, runtime, view_data, tx),
        KeyCode::Char('F') => apply_command(state, runtime, view_data, tx, AppCommand::OpenFixAll),
        KeyCode::Char('r') => {
            if state.is_refreshing() {
                emit_status(state, runtime, view_data, tx, "refresh already running");
            } else {
                apply_command(state, runtime, view_data, tx, AppCommand::Refresh);
            }
        }
        KeyCode::Char('d') => view_data.options.show_detail = !view_data.options.show_detail,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Esc => {
            if state.fault.is_some() {
                apply_command(state, runtime, view_data, tx, AppCommand::DismissFault);
            } else {
                apply_command(state, runtime, view_data, tx, AppCommand::ClearSearch);
            }
        }
        _ => {}
    }
    false
}

fn activate_selected<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(record) = selected_record(state, view_data) else {
        return;
    };
    let path = record.path.clone();
    match state.fix_control_for(record) {
        FixControl::Eligible => {
            apply_command(state, runtime, view_data, tx, AppCommand::ActivateFix(path));
        }
        FixControl::DisabledOk => {
            emit_status(state, runtime, view_data, tx, "chapter is already ok");
        }
        FixControl::Busy => {
            emit_status(state, runtime, view_data, tx, "fix already running");
        }
    }
}

fn bulk_overlay_visible(state: &AppState, view_data: &ViewData) -> bool {
    match state.bulk {
        BulkFixState::Idle => false,
        BulkFixState::Confirming => true,
        BulkFixState::Busy => !view_data.bulk_overlay_hidden,
    }
}

fn handle_bulk_overlay_key<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (state.bulk, key.code) {
        (BulkFixState::Confirming, KeyCode::Char('y') | KeyCode::Enter) => {
            apply_command(state, runtime, view_data, tx, AppCommand::ConfirmFixAll);
        }
        (BulkFixState::Confirming, KeyCode::Char('n') | KeyCode::Esc) => {
            apply_command(state, runtime, view_data, tx, AppCommand::CancelFixAll);
        }
        (BulkFixState::Busy, KeyCode::Esc) => {
            view_data.bulk_overlay_hidden = true;
        }
        _ => {}
    }
}

fn project_table(state: &AppState) -> TableProjection {
    let outcome = state.visible();
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let rows = outcome
        .visible
        .iter()
        .map(|record| ChapterRow {
            path: record.path.clone(),
            has_cover: record.cover_url.is_some(),
            cover_url: text(&record.cover_url),
            title: text(&record.title),
            link: record
                .series_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_LINK.to_owned()),
            alt_titles: record.alt_titles.clone(),
            filename: text(&record.filename),
            volume: record
                .parsed_volume
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            chapter: record
                .parsed_chapter
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            comicinfo_date: text(&record.comicinfo_date),
            official_date: text(&record.official_date),
            file_mod_date: text(&record.file_mod_date),
            status: record.status.clone(),
            control: state.fix_control_for(record),
        })
        .collect();

    TableProjection {
        rows,
        fixable_count: outcome.fixable_count,
    }
}

fn status_glyph(status: &ChapterStatus) -> &'static str {
    match status {
        ChapterStatus::Ok => "✅",
        ChapterStatus::Wrong => "⚠",
        ChapterStatus::Missing => "❌",
        ChapterStatus::Unknown(_) => "",
    }
}

fn status_style(status: &ChapterStatus) -> Style {
    let color = match status {
        ChapterStatus::Ok => Color::Green,
        ChapterStatus::Wrong => Color::Yellow,
        ChapterStatus::Missing => Color::Red,
        ChapterStatus::Unknown(_) => return Style::default(),
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn fix_control_label(control: FixControl, spinner: &str) -> String {
    match control {
        FixControl::Eligible => "[ fix ]".to_owned(),
        FixControl::DisabledOk => "[  -  ]".to_owned(),
        FixControl::Busy => format!("[  {spinner}  ]"),
    }
}

fn fix_control_style(control: FixControl) -> Style {
    match control {
        FixControl::Eligible => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        FixControl::DisabledOk => Style::default().fg(Color::DarkGray),
        FixControl::Busy => Style::default().fg(Color::Cyan),
    }
}

fn format_loaded_at(loaded_at: Option<OffsetDateTime>, offset: UtcOffset) -> String {
    let Some(loaded_at) = loaded_at else {
        return "never".to_owned();
    };
    loaded_at
        .to_offset(offset)
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| "unknown".to_owned())
}

fn header_text(state: &AppState, view_data: &ViewData, fixable_count: usize) -> String {
    let mut parts = Vec::new();
    if !view_data.options.service_label.is_empty() {
        parts.push(view_data.options.service_label.clone());
    }
    parts.push(format!(
        "loaded {}",
        format_loaded_at(state.store.loaded_at(), view_data.options.utc_offset)
    ));
    parts.push(format!("fixable: {fixable_count}"));
    if state.is_refreshing() {
        parts.push(format!("refreshing {}", view_data.spinner()));
    }
    if state.fixes_in_flight() > 0 {
        parts.push(format!("fixing {}", state.fixes_in_flight()));
    }
    if state.bulk == BulkFixState::Busy {
        parts.push(format!("fix all {}", view_data.spinner()));
    }
    parts.join(" | ")
}

fn filter_bar_line(state: &AppState) -> Line<'static> {
    let search_style = if state.mode == AppMode::Search {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cursor = if state.mode == AppMode::Search { "_" } else { "" };

    let mut spans = vec![
        Span::raw("search: "),
        Span::styled(format!("{}{cursor}", state.search), search_style),
        Span::raw("   status: "),
    ];
    for (index, filter) in StatusFilter::ALL.iter().enumerate() {
        let label = format!(" {} {} ", index + 1, filter.as_str());
        if *filter == state.status_filter {
            spans.push(Span::styled(
                format!("({label})"),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!(" {label} ")));
        }
    }
    Line::from(spans)
}

fn detail_text(row: Option<&ChapterRow>) -> String {
    let Some(row) = row else {
        return "no chapter selected".to_owned();
    };
    let mut lines = vec![
        format!("path: {}", row.path),
        format!("title: {} {LINK_ARROW} {}", row.title, row.link),
    ];
    if row.has_cover {
        lines.push(format!("cover: {}", row.cover_url));
    }
    lines.push(format!(
        "status: {} {}",
        status_glyph(&row.status),
        row.status.as_str()
    ));
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
    };
    let hints = match state.mode {
        AppMode::Nav => "j/k g/G | / search | s/S 1-4 filter | f fix | F fix all | r refresh | d detail | ? help | q",
        AppMode::Search => "type to filter | backspace | ctrl+u clear | enter/esc done",
    };

    let mut parts = vec![mode.to_owned()];
    if let Some(fault) = &state.fault {
        parts.push(format!("error: {} (esc to dismiss)", fault.summary()));
    }
    if let Some(status) = &state.status_line {
        parts.push(status.clone());
    }
    if !view_data.help_visible {
        parts.push(hints.to_owned());
    }
    parts.join(" | ")
}

fn bulk_overlay_text(state: &AppState, view_data: &ViewData, fixable_count: usize) -> String {
    match state.bulk {
        BulkFixState::Busy => format!(
            "{} fixing all chapters...\n\nesc hides this dialog; the request keeps running",
            view_data.spinner()
        ),
        _ => format!(
            "Fix all {fixable_count} fixable chapters?\n\nThe service applies the fix to every chapter marked wrong or missing.\n\ny/enter confirm | n/esc cancel"
        ),
    }
}

fn help_overlay_text() -> String {
    [
        "j/k, arrows      move selection",
        "pgup/pgdn        move ten rows",
        "g/G, home/end    first/last row",
        "/                edit search text",
        "s/S              next/previous status filter",
        "1 2 3 4          all / ok / wrong / missing",
        "f, enter         fix selected chapter",
        "F                fix all fixable chapters",
        "r                reload chapters",
        "d                toggle detail pane",
        "esc              dismiss error, else clear search",
        "q, ctrl+q        quit",
    ]
    .join("\n")
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let projection = project_table(state);
    let detail_height = if view_data.options.show_detail { 6 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(detail_height),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data, projection.fixable_count))
        .block(Block::default().title("chapterdash").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let filters = Paragraph::new(filter_bar_line(state)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    render_table(frame, layout[2], &projection, view_data);

    if view_data.options.show_detail {
        let detail = Paragraph::new(detail_text(projection.rows.get(view_data.selected_row)))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("detail").borders(Borders::ALL));
        frame.render_widget(detail, layout[3]);
    }

    let status_style = if state.fault.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let status = Paragraph::new(status_text(state, view_data))
        .style(status_style)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[4]);

    if bulk_overlay_visible(state, view_data) {
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(bulk_overlay_text(
            state,
            view_data,
            projection.fixable_count,
        ))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("fix all")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    projection: &TableProjection,
    view_data: &ViewData,
) {
    let header = Row::new(COLUMNS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let spinner = view_data.spinner();
    let muted = Style::default().fg(Color::DarkGray);
    let rows = projection.rows.iter().map(|row| {
        let height = row.alt_titles.len().max(1) as u16;
        let title_style = if row.link == PLACEHOLDER_LINK {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::UNDERLINED)
        };
        Row::new(vec![
            Cell::from(if row.has_cover { COVER_MARK } else { "" }),
            Cell::from(row.title.clone()).style(title_style),
            Cell::from(Text::from(
                row.alt_titles
                    .iter()
                    .map(|alt| Line::from(alt.clone()))
                    .collect::<Vec<_>>(),
            ))
            .style(muted),
            Cell::from(row.filename.clone()),
            Cell::from(row.volume.clone()),
            Cell::from(row.chapter.clone()),
            Cell::from(row.comicinfo_date.clone()),
            Cell::from(row.official_date.clone()),
            Cell::from(row.file_mod_date.clone()).style(muted),
            Cell::from(status_glyph(&row.status)).style(status_style(&row.status)),
            Cell::from(fix_control_label(row.control, spinner)).style(fix_control_style(row.control)),
        ])
        .height(height)
    });

    let widths = [
        Constraint::Length(1),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Fill(3),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(2),
        Constraint::Length(7),
    ];
    let title = format!("chapters ({})", projection.rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().title(title).borders(Borders::ALL));

    let mut table_state = TableState::default();
    if !projection.rows.is_empty() {
        table_state.select(Some(view_data.selected_row.min(projection.rows.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
