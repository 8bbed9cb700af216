//! Full-screen terminal UI.
//!
//! The loop owns the [`ChatApp`] and is the only place state changes. It
//! selects over terminal input, the event bus and a 100 ms ticker that drives
//! the response timer, spinners, toasts and tool-panel deadlines.

mod draw;
mod input;
mod spinner;

pub use draw::{draw, ViewState};
pub use input::{handle_key, InputBuffer, UiAction};
pub use spinner::Spinner;

use crate::chat::{ChatApp, Effect};
use crate::export::ExportClient;
use crate::messaging::{AppEvent, EventReceiver, EventSender};
use crossterm::event::{
    DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange, Event,
    EventStream,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// UI refresh period.
pub const TICK: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Whether the loop keeps going after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the UI until the user quits or the event bus closes.
pub async fn run(
    mut app: ChatApp,
    mut events: EventReceiver,
    sender: EventSender,
    exporter: ExportClient,
) -> anyhow::Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut events, &sender, &exporter).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> anyhow::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Term) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop(
    terminal: &mut Term,
    app: &mut ChatApp,
    events: &mut EventReceiver,
    sender: &EventSender,
    exporter: &ExportClient,
) -> anyhow::Result<()> {
    let mut term_events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut view = ViewState::new(Instant::now());
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|frame| draw(frame, app, &mut view, Instant::now()))?;
            dirty = false;
        }

        tokio::select! {
            _ = ticker.tick() => {
                dirty = app.tick(Instant::now()) || app.tools().is_visible();
            }
            event = events.recv() => match event {
                Ok(event) => {
                    apply_events(app, event, events);
                    dirty = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Event bus closed");
                    break;
                }
            },
            maybe_event = term_events.next() => match maybe_event {
                Some(Ok(event)) => {
                    if handle_terminal_event(event, app, &mut view, sender, exporter) == Flow::Quit {
                        break;
                    }
                    dirty = true;
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

/// Apply `first` and everything already queued behind it, so a burst of
/// chunks costs one redraw.
fn apply_events(app: &mut ChatApp, first: AppEvent, events: &mut EventReceiver) -> usize {
    let mut next = Some(first);
    let mut applied = 0;
    while let Some(event) = next {
        tracing::trace!(event = event.label(), "Event");
        app.handle_event(event, Instant::now());
        applied += 1;
        next = events.try_recv().ok().flatten();
    }
    applied
}

fn handle_terminal_event(
    event: Event,
    app: &mut ChatApp,
    view: &mut ViewState,
    sender: &EventSender,
    exporter: &ExportClient,
) -> Flow {
    let now = Instant::now();
    match event {
        Event::Key(key) => match handle_key(key, app.modal().is_some(), &mut view.input) {
            UiAction::Quit => return Flow::Quit,
            UiAction::Submit => {
                let text = view.input.text().to_string();
                match app.submit(&text, now) {
                    Effect::Rejected => {}
                    Effect::None => {
                        view.input.take();
                        view.scroll_from_bottom = 0;
                    }
                    Effect::Export(conversation_id) => {
                        view.input.take();
                        spawn_export(exporter.clone(), conversation_id, sender.clone());
                    }
                    Effect::Quit => return Flow::Quit,
                }
            }
            UiAction::Resolve(accepted) => app.resolve_modal(accepted),
            UiAction::ScrollUp(lines) => view.scroll_up(lines),
            UiAction::ScrollDown(lines) => view.scroll_down(lines),
            UiAction::ScrollToBottom => view.scroll_from_bottom = 0,
            UiAction::Edited | UiAction::None => {}
        },
        Event::Paste(text) => {
            if app.modal().is_none() {
                for c in text.chars().filter(|c| *c != '\r') {
                    view.input.insert(c);
                }
            }
        }
        Event::FocusGained => app.set_focused(true),
        Event::FocusLost => app.set_focused(false),
        Event::Mouse(_) | Event::Resize(_, _) => {}
    }
    Flow::Continue
}

fn spawn_export(exporter: ExportClient, conversation_id: String, sender: EventSender) {
    tracing::info!(conversation_id = %conversation_id, "Exporting conversation");
    tokio::spawn(async move {
        let result = exporter.export(&conversation_id).await;
        sender.export_finished(result);
    });
}
