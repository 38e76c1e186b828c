mod charts;
mod export;
mod help;
mod state;

use crate::api::{ApiClient, ClientConfig};
use crate::dashboard::{run_stats, DraftField};
use crate::feed;
use crate::model::{AppEvent, Experiment, RunBundle, RunStatus};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{EditTarget, KeyOutcome, LaunchField, Tab, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const RUN_PLACEHOLDER: &str = "Launch a run to see detailed model comparison.";

pub async fn run(cfg: ClientConfig) -> Result<()> {
    let client = ApiClient::new(&cfg)?;
    // Unbounded channels: the UI thread never waits on the controller and vice versa.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let base_url = client.base_url().to_string();
    let ui_handle = std::thread::spawn(move || run_threaded(base_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn send_all(cmd_tx: &UnboundedSender<UiCommand>, cmds: Vec<UiCommand>) {
    for cmd in cmds {
        let _ = cmd_tx.send(cmd);
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    base_url: String,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(base_url);
    let initial = state.dash.refresh();
    send_all(&cmd_tx, initial);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            let follow_up = state.dash.apply(ev);
            send_all(&cmd_tx, follow_up);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(k) {
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyOutcome::Commands(cmds) => send_all(&cmd_tx, cmds),
                    KeyOutcome::ExportRun => export_current(&mut state),
                    KeyOutcome::CopyCorrelationId => copy_correlation_id(&mut state),
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn export_current(state: &mut UiState) {
    let Some(bundle) = state.dash.run.committed() else {
        state.dash.set_info("No committed run to export yet.");
        return;
    };
    let msg = match export::export_run_json(bundle, std::path::Path::new(".")) {
        Ok(p) => format!("Exported JSON: {}", p.display()),
        Err(e) => format!("Export failed: {e:#}"),
    };
    state.dash.set_info(msg);
}

fn copy_correlation_id(state: &mut UiState) {
    let Some(id) = state
        .dash
        .run
        .committed()
        .map(|b| b.run.correlation_id.clone())
    else {
        state.dash.set_info("No run to copy from yet.");
        return;
    };
    let msg = match export::copy_to_clipboard(&id) {
        Ok(()) => format!("Copied correlation id {id}"),
        Err(e) => format!("Clipboard failed: {e:#}"),
    };
    state.dash.set_info(msg);
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| Line::from(t.title())))
        .select(state.tab.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("modeleval-dash · {}", state.base_url)),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    draw_status(chunks[1], f, state);

    match state.tab {
        Tab::Experiments => draw_experiments(chunks[2], f, state),
        Tab::Compose => draw_compose(chunks[2], f, state),
        Tab::Run => draw_run(chunks[2], f, state),
        Tab::Help => help::draw_help(chunks[2], f),
    }
}

/// Error banner, else info line, with the loading indicator on the left.
fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    if state.dash.is_loading() {
        let phase = state.dash.run.phase();
        let what = if phase.can_launch() { "loading" } else { phase.label() };
        spans.push(Span::styled(
            format!(" working: {what} "),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        spans.push(Span::raw(" "));
    }
    if let Some(err) = state.dash.error() {
        spans.push(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled("  (x to dismiss)", Style::default().fg(Color::Gray)));
    } else if let Some(info) = state.dash.info() {
        spans.push(Span::styled(info.to_string(), Style::default().fg(Color::Gray)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_experiments(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let experiments = state.dash.catalog.experiments();
    let items: Vec<ListItem> = experiments
        .iter()
        .map(|e| {
            ListItem::new(vec![
                Line::from(e.name.clone()),
                Line::styled(
                    format!("  {} · {}", e.workload_type.as_str(), e.dataset_ref),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Experiments ({})", experiments.len())),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(state.dash.catalog.selected_index());
    f.render_stateful_widget(list, cols[0], &mut list_state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(cols[1]);

    let detail_lines = match state.dash.catalog.detail() {
        Some(exp) => experiment_lines(exp),
        None => vec![Line::from("Select an experiment.")],
    };
    f.render_widget(
        Paragraph::new(detail_lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Experiment")),
        right[0],
    );

    let launch = &state.dash.launch;
    let field = |label: &str, value: &str, target: LaunchField| {
        let editing = state
            .editing
            .as_ref()
            .filter(|b| b.target == EditTarget::Launch(target));
        match editing {
            Some(buf) => Line::from(vec![
                Span::raw(format!("{label}: ")),
                Span::styled(format!("{}_", buf.text), Style::default().fg(Color::Yellow)),
            ]),
            None => Line::from(format!("{label}: {value}")),
        }
    };
    let can_launch = state.dash.catalog.selected_detail().is_some()
        && !state.dash.is_loading()
        && state.dash.run.phase().can_launch();
    let launch_lines = vec![
        field("Seed (S)", &launch.seed, LaunchField::Seed),
        field(
            "Failure threshold (T)",
            &launch.failure_threshold,
            LaunchField::Threshold,
        ),
        Line::from(vec![
            Span::raw("Orchestrator: "),
            Span::styled(
                state.dash.run.phase().label(),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::styled(
            if can_launch {
                "press l to launch"
            } else {
                "launch unavailable"
            },
            Style::default().fg(if can_launch { Color::Green } else { Color::DarkGray }),
        ),
    ];
    f.render_widget(
        Paragraph::new(launch_lines).block(Block::default().borders(Borders::ALL).title("Launch")),
        right[1],
    );
}

fn experiment_lines(exp: &Experiment) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(exp.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::from(format!("Id: {}", exp.id)),
        Line::from(format!("Workload: {}", exp.workload_type.as_str())),
        Line::from(format!("Dataset: {}", exp.dataset_ref)),
        Line::from(format!(
            "Dataset hash: {}",
            exp.dataset_hash.as_deref().unwrap_or("-")
        )),
        Line::from(format!("Budget: ${}", exp.budget_usd)),
        Line::from(format!("Max tasks: {}", exp.sampling.max_tasks)),
        Line::from(format!("Seed: {}", exp.seed)),
        Line::from(""),
        Line::from(format!("Model arms ({}):", exp.model_arms.len())),
    ];
    for arm in &exp.model_arms {
        lines.push(Line::from(format!(
            "  {} ({}/{})",
            arm.display_name,
            arm.provider.as_str(),
            arm.model_name
        )));
    }
    lines
}

fn draw_compose(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let composer = &state.dash.composer;
    let items: Vec<ListItem> = composer
        .fields()
        .into_iter()
        .map(|field| {
            let editing = state
                .editing
                .as_ref()
                .filter(|b| b.target == EditTarget::Draft(field));
            let value = match editing {
                Some(buf) => Span::styled(
                    format!("{}_", buf.text),
                    Style::default().fg(Color::Yellow),
                ),
                None if field.is_selector() => Span::styled(
                    format!("‹ {} ›", composer.value(field)),
                    Style::default().fg(Color::Cyan),
                ),
                None => Span::raw(composer.value(field)),
            };
            let label_style = match field {
                DraftField::ArmProvider(_) => Style::default().fg(Color::Magenta),
                _ => Style::default().fg(Color::Gray),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<24}", field.label()), label_style),
                value,
            ]))
        })
        .collect();

    let title = if state.dash.is_loading() {
        "New Experiment (working…)"
    } else {
        "New Experiment (c to create)"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(state.compose_cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_run(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(bundle) = state.dash.run.committed() else {
        f.render_widget(
            Paragraph::new(RUN_PLACEHOLDER).block(Block::default().borders(Borders::ALL).title("Run")),
            area,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Min(6),
        ])
        .split(area);

    draw_run_header(rows[0], f, bundle);

    let summary_rows = state.dash.run.summary_rows();
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    charts::draw_quality_cost(middle[0], f, summary_rows);
    charts::draw_comparison_table(middle[1], f, summary_rows);

    draw_feed(rows[2], f, bundle, state.dash.run.feed_scroll);
}

fn draw_run_header(area: Rect, f: &mut ratatui::Frame, bundle: &RunBundle) {
    let stats = run_stats(bundle);
    let pill = |label: &str, value: String, color: Color| {
        vec![
            Span::styled(format!("{label} "), Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw("   "),
        ]
    };
    let status_color = match bundle.run.status {
        RunStatus::Succeeded => Color::Green,
        RunStatus::Failed => Color::Red,
        RunStatus::Queued | RunStatus::Running => Color::Yellow,
    };
    let mut spans = Vec::new();
    spans.extend(pill("Status", stats.status, status_color));
    spans.extend(pill("Run ID", stats.short_id, Color::White));
    spans.extend(pill("Attempts", stats.attempts.to_string(), Color::White));
    spans.extend(pill("Top Model", stats.top_model, Color::Cyan));
    spans.extend(pill("Duration", stats.duration, Color::White));

    let mut lines = vec![
        Line::from(spans),
        Line::from(vec![
            Span::styled("Correlation ", Style::default().fg(Color::Gray)),
            Span::raw(bundle.run.correlation_id.clone()),
            Span::styled("  (y to copy)", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    if let Some(err) = bundle.run.error_message.as_deref() {
        lines[1]
            .spans
            .push(Span::styled(format!("  {err}"), Style::default().fg(Color::Red)));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Run")),
        area,
    );
}

fn draw_feed(area: Rect, f: &mut ratatui::Frame, bundle: &RunBundle, scroll: usize) {
    let items: Vec<ListItem> = feed::feed_entries(&bundle.attempts)
        .into_iter()
        .map(|entry| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(entry.arm, Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  {} · {}", entry.latency, entry.cost),
                        Style::default().fg(Color::Gray),
                    ),
                ]),
                Line::from(format!("  {}", entry.body.replace('\n', " "))),
            ])
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Attempts ({})", bundle.attempts.len())),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    let selected = (!bundle.attempts.is_empty()).then_some(scroll);
    let mut list_state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut list_state);
}
