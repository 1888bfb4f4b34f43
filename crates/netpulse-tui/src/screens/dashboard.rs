//! Dashboard screen: the selected device's metric charts and the global
//! alert table.
//!
//! Layout:
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ netpulse │ edge-1 (10.0.0.1)      Updated 05/01/24, 08:00:30 AM  ET │
//! │ 1 [edge-1]  2 core-2  3 branch-3                                     │
//! │ ┌─ CPU % ──────────┐ ┌─ Memory % ───────┐ ┌─ Packet Loss % ───────┐ │
//! │ │  Braille line    │ │  Braille line    │ │  Braille line         │ │
//! │ └──────────────────┘ └──────────────────┘ └───────────────────────┘ │
//! │ ┌─ Recent Alerts ───────────────────────────────────────────────────┐ │
//! │ │ Device  Metric  Value  Severity  Time (ET)                         │ │
//! │ └───────────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────────┘

use std::sync::Arc;

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table,
    TableState,
};

use netpulse_core::{Alert, MetricKind, MetricPoint, ViewState};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{device_bar, time_fmt};

/// Shown in the value column when the backend sent no value.
const VALUE_PLACEHOLDER: &str = "—";

pub struct DashboardScreen {
    view: Arc<ViewState>,
    alert_cursor: usize,
    now: DateTime<Utc>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            view: Arc::new(ViewState::default()),
            alert_cursor: 0,
            now: Utc::now(),
        }
    }

    /// Neighbouring device in backend order, wrapping at both ends. With
    /// nothing selected yet the first device is picked.
    fn step_device(&self, forward: bool) -> Option<Action> {
        let devices = &self.view.devices;
        let len = devices.len();
        if len == 0 {
            return None;
        }
        let next = match self.view.selected_index() {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        devices
            .get(next)
            .map(|d| Action::SelectDevice(d.id.clone()))
    }

    fn device_at(&self, digit: char) -> Option<Action> {
        let index = usize::try_from(digit.to_digit(10)?).ok()?.checked_sub(1)?;
        self.view
            .devices
            .get(index)
            .map(|d| Action::SelectDevice(d.id.clone()))
    }

    fn acknowledge_at_cursor(&self) -> Option<Action> {
        self.view
            .alerts
            .get(self.alert_cursor)
            .filter(|a| !a.acknowledged)
            .map(|a| Action::AcknowledgeAlert(a.id.clone()))
    }

    fn clamp_cursor(&mut self) {
        let last = self.view.alerts.len().saturating_sub(1);
        self.alert_cursor = self.alert_cursor.min(last);
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let device = self.view.selected_device().map_or_else(
            || "no device selected".to_owned(),
            |d| match &d.host {
                Some(host) => format!("{} ({host})", d.display_name()),
                None => d.display_name().to_owned(),
            },
        );

        let mut left = vec![
            Span::styled(" netpulse ", theme::title_style()),
            Span::styled("│ ", theme::key_hint()),
            Span::styled(device, Style::default().fg(theme::DIM_WHITE)),
        ];
        if self.view.series_are_stale() {
            left.push(Span::styled("  (showing previous device)", theme::key_hint()));
        }

        let right = Line::from(vec![
            Span::styled("Updated ", theme::key_hint()),
            Span::styled(
                time_fmt::long(self.view.last_update),
                Style::default().fg(theme::DIM_WHITE),
            ),
            Span::styled("   ", theme::key_hint()),
            Span::styled(
                time_fmt::long(Some(self.now)),
                Style::default().fg(theme::NEON_CYAN),
            ),
            Span::styled(" ET ", theme::key_hint()),
        ])
        .right_aligned();

        frame.render_widget(Paragraph::new(Line::from(left)), area);
        frame.render_widget(Paragraph::new(right), area);
    }

    fn render_charts(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

        for ((kind, color), column) in MetricKind::ALL
            .into_iter()
            .zip(theme::METRIC_SERIES)
            .zip(columns.iter())
        {
            render_metric_chart(frame, *column, kind, self.view.series.get(kind), color);
        }
    }

    fn render_alerts(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Recent Alerts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        if self.view.alerts.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new("  No alerts yet").style(Style::default().fg(theme::BORDER_GRAY)),
                inner,
            );
            return;
        }

        let header = Row::new(
            ["", "Device", "Metric", "Value", "Severity", "Time (ET)"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let rows: Vec<Row> = self.view.alerts.iter().map(alert_row).collect();

        let widths = [
            Constraint::Length(2),  // ack marker
            Constraint::Fill(2),    // device
            Constraint::Fill(2),    // metric
            Constraint::Length(9),  // value
            Constraint::Length(9),  // severity
            Constraint::Length(22), // time
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(theme::table_selected());

        let mut state = TableState::default().with_selected(Some(self.alert_cursor));
        frame.render_stateful_widget(table, area, &mut state);
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return Ok(None);
        }
        let action = match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.step_device(false),
            KeyCode::Right | KeyCode::Char('l') => self.step_device(true),
            KeyCode::Char(c @ '1'..='9') => self.device_at(c),
            KeyCode::Char('p') => Some(Action::PollNow),
            KeyCode::Char('r') => Some(Action::RefreshNow),
            KeyCode::Char('d') => Some(Action::ReloadDevices),
            KeyCode::Char('a') => self.acknowledge_at_cursor(),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::CursorDown),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::CursorUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ViewUpdated(view) => {
                self.view = Arc::clone(view);
                self.clamp_cursor();
            }
            Action::Tick => self.now = Utc::now(),
            Action::CursorDown => {
                self.alert_cursor = self.alert_cursor.saturating_add(1);
                self.clamp_cursor();
            }
            Action::CursorUp => self.alert_cursor = self.alert_cursor.saturating_sub(1),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),      // header
            Constraint::Length(1),      // device bar
            Constraint::Min(8),         // charts
            Constraint::Percentage(40), // alerts
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        frame.render_widget(
            Paragraph::new(device_bar::render_device_bar(
                &self.view.devices,
                self.view.selected_index(),
            )),
            layout[1],
        );
        self.render_charts(frame, layout[2]);
        self.render_alerts(frame, layout[3]);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Two decimals, or the placeholder when the backend sent no value.
fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| VALUE_PLACEHOLDER.to_owned(), |v| format!("{v:.2}"))
}

fn alert_row(alert: &Alert) -> Row<'static> {
    let marker = if alert.acknowledged { "✓" } else { "" };
    let row_style = if alert.acknowledged {
        theme::table_row().add_modifier(Modifier::DIM)
    } else {
        theme::table_row()
    };
    Row::new(vec![
        Cell::from(marker).style(Style::default().fg(theme::SUCCESS_GREEN)),
        Cell::from(alert.device_id.clone()),
        Cell::from(alert.metric_type.clone()),
        Cell::from(format_value(alert.value)),
        Cell::from(alert.severity.to_string()).style(theme::severity(alert.severity)),
        Cell::from(time_fmt::long(Some(alert.timestamp))),
    ])
    .style(row_style)
}

/// `(unix seconds, value)` pairs for the chart canvas.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn chart_points(points: &[MetricPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.timestamp.timestamp_millis() as f64 / 1000.0, p.value))
        .collect()
}

/// First, middle and last sample times in short format.
fn x_labels(points: &[MetricPoint]) -> Vec<String> {
    let at = |i: usize| time_fmt::short(points.get(i).map(|p| p.timestamp));
    match points.len() {
        0 => Vec::new(),
        1 => vec![at(0)],
        n => vec![at(0), at(n / 2), at(n - 1)],
    }
}

fn render_metric_chart(
    frame: &mut Frame,
    area: Rect,
    kind: MetricKind,
    points: &[MetricPoint],
    color: Color,
) {
    let block = Block::default()
        .title(format!(" {} ", kind.label()))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());

    if points.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(format!("  No {} data yet", kind.as_str().replace('_', " ")))
                .style(Style::default().fg(theme::BORDER_GRAY)),
            inner,
        );
        return;
    }

    let data = chart_points(points);
    let x_min = data.first().map_or(0.0, |&(x, _)| x);
    let x_max = data.last().map_or(1.0, |&(x, _)| x).max(x_min + 1.0);
    // Always anchored at zero.
    let y_max = (data.iter().map(|&(_, y)| y).fold(0.0_f64, f64::max) * 1.1).max(1.0);

    let axis_style = Style::default().fg(theme::BORDER_GRAY);
    let dataset = Dataset::default()
        .name(kind.label())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .legend_position(None)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(x_labels(points))
                .style(axis_style),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels([String::from("0"), format!("{y_max:.0}")])
                .style(axis_style),
        );

    frame.render_widget(chart, area);
}
