//! Application core: event loop, action dispatch, engine intents.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use netpulse_core::{
    CoreError, Notification, NotificationLevel, RefreshOutcome, SyncEngine, ViewState,
};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::DashboardScreen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::time_fmt;

/// How long a toast stays in the status line.
const TOAST_TTL: Duration = Duration::from_secs(5);

struct Toast {
    note: Notification,
    shown_at: Instant,
}

pub struct App {
    engine: SyncEngine,
    dashboard: DashboardScreen,
    /// Latest snapshot, for the status line.
    view: Arc<ViewState>,
    toast: Option<Toast>,
    throbber: ThrobberState,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(engine: SyncEngine) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            dashboard: DashboardScreen::new(),
            view: Arc::new(ViewState::default()),
            toast: None,
            throbber: ThrobberState::default(),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge_cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.engine.clone(),
            self.action_tx.clone(),
            bridge_cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        bridge_cancel.cancel();
        let _ = bridge.await;
        self.engine.shutdown().await;
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            _ => {}
        }

        self.dashboard.handle_key_event(key)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(note) => {
                self.toast = Some(Toast {
                    note: note.clone(),
                    shown_at: Instant::now(),
                });
            }

            Action::SelectDevice(_)
            | Action::PollNow
            | Action::RefreshNow
            | Action::ReloadDevices
            | Action::AcknowledgeAlert(_) => self.spawn_intent(action.clone()),

            Action::ViewUpdated(view) => {
                self.view = Arc::clone(view);
                self.forward(action)?;
            }

            Action::Tick => {
                if self.view.refreshing {
                    self.throbber.calc_next();
                }
                if self
                    .toast
                    .as_ref()
                    .is_some_and(|t| t.shown_at.elapsed() >= TOAST_TTL)
                {
                    self.toast = None;
                }
                self.forward(action)?;
            }

            // Render is handled in the main loop
            Action::Render => {}

            other => self.forward(other)?,
        }
        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.dashboard.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Intents run off the UI loop; their result comes back as a toast.
    fn spawn_intent(&self, action: Action) {
        debug!(?action, "dispatching intent");
        let engine = self.engine.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Some(note) = run_intent(&engine, action).await {
                let _ = tx.send(Action::Notify(note));
            }
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Dashboard
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.dashboard.render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);

        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::horizontal([Constraint::Length(14), Constraint::Min(0)]).split(area);

        if self.view.refreshing {
            let throbber = Throbber::default()
                .label("Refreshing")
                .style(Style::default().fg(theme::ELECTRIC_YELLOW))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, columns[0], &mut self.throbber.clone());
        } else {
            let phase = Line::from(vec![
                Span::raw(" "),
                Span::styled(format!("● {}", self.view.phase), theme::phase(self.view.phase)),
            ]);
            frame.render_widget(Paragraph::new(phase), columns[0]);
        }

        let mut spans = Vec::new();
        if self.view.poll_pending {
            spans.push(Span::styled("│ polling… ", Style::default().fg(theme::ELECTRIC_YELLOW)));
        }
        if self.view.last_poll_at.is_some() {
            spans.push(Span::styled("│ last poll ", theme::key_hint()));
            spans.push(Span::styled(
                format!("{} ", time_fmt::short_raw(self.view.last_poll_at.as_deref())),
                Style::default().fg(theme::DIM_WHITE),
            ));
        }
        match (&self.toast, &self.view.last_error) {
            (Some(toast), _) => spans.push(Span::styled(
                format!("│ {} ", toast.note.message),
                theme::notification(toast.note.level),
            )),
            (None, Some(error)) => spans.push(Span::styled(
                format!("│ {error} "),
                theme::notification(NotificationLevel::Error),
            )),
            _ => {}
        }
        spans.push(Span::styled(
            "│ ←/→ device  p poll  r refresh  ? help  q quit",
            theme::key_hint(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), columns[1]);
    }
}

/// Run one intent against the engine. Backend failures already reach the
/// status line through the engine's notifications, so only local
/// rejections and successes produce a toast here.
async fn run_intent(engine: &SyncEngine, action: Action) -> Option<Notification> {
    let result = match action {
        Action::SelectDevice(id) => engine.select_device(id).await.map(|_| None),
        Action::PollNow => engine
            .poll_now()
            .await
            .map(|outcome| (outcome == RefreshOutcome::Applied).then(|| info_note("Poll complete"))),
        Action::RefreshNow => engine.refresh_now().await.map(|_| None),
        Action::ReloadDevices => engine
            .reload_devices()
            .await
            .map(|count| Some(info_note(format!("Loaded {count} devices")))),
        Action::AcknowledgeAlert(id) => {
            let done = format!("Alert {id} acknowledged");
            engine
                .acknowledge_alert(id)
                .await
                .map(|_| Some(info_note(done)))
        }
        _ => return None,
    };

    match result {
        Ok(note) => note,
        Err(e) if is_local_rejection(&e) => Some(Notification {
            level: NotificationLevel::Warning,
            message: e.to_string(),
        }),
        Err(e) => {
            debug!(error = %e, "intent failed");
            None
        }
    }
}

fn is_local_rejection(e: &CoreError) -> bool {
    matches!(
        e,
        CoreError::NoDeviceSelected | CoreError::EngineStopped | CoreError::NotFound { .. }
    )
}

fn info_note(message: impl Into<String>) -> Notification {
    Notification {
        level: NotificationLevel::Info,
        message: message.into(),
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 52u16.min(area.width.saturating_sub(4));
    let help_height = 16u16.min(area.height.saturating_sub(4));
    let help_area = Rect::new(
        area.x + area.width.saturating_sub(help_width) / 2,
        area.y + area.height.saturating_sub(help_height) / 2,
        help_width,
        help_height,
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        help_area,
    );

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        entry("←/→ h/l", "Previous / next device"),
        entry("1-9", "Select device by number"),
        entry("j/k ↑/↓", "Move alert cursor"),
        entry("a", "Acknowledge highlighted alert"),
        entry("p", "Poll now"),
        entry("r", "Refresh now"),
        entry("d", "Reload device list"),
        entry("?", "This help"),
        entry("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}
