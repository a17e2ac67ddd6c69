//! Marquee CLI - Terminal-based region annotation for images

mod io;
mod ui;

use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::prelude::*;
use tracing::{debug, error, info, warn};

use marquee_core::{App, Button, HostRequest, Key, KeyEvent, Modifiers, Phase, PointerEvent};

/// How long to wait for input when no repeat timer is armed
const IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "marquee", version, about = "Mark and describe regions of an image")]
struct Args {
    /// Image to annotate
    image: PathBuf,

    /// Where Ctrl+S writes the export (default: the image path with a .tlf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Restore markers from a previous export
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Configuration file (default: <config dir>/marquee/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Host-side state the core does not track
struct Session {
    output: PathBuf,
    /// The terminal reports key releases
    release_events: bool,
}

fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let logs_dir = io::marquee_dir().ok()?.join("logs");
    if std::fs::create_dir_all(&logs_dir).is_err() {
        return None;
    }

    let log_file_path = logs_dir.join("marquee.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "marquee.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The terminal UI owns stdout, so only the file gets logs
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let filter = EnvFilter::try_from_env("MARQUEE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,marquee_core=debug,marquee=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(guard)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging();

    let config = io::load_config(args.config.as_deref())?;
    let image = io::load_image_info(&args.image)?;

    let mut app = App::with_config(config);
    app.load_image(image);

    if let Some(path) = &args.import {
        match io::load_annotations_file(path) {
            Ok(annotations) => {
                let count = annotations.len();
                app.load_annotations(annotations);
                app.set_status(&format!("Imported {} markers from {}", count, path.display()));
            }
            Err(e) => {
                warn!(error = %e, "import failed");
                app.set_status(&format!("Import failed: {:#}", e));
            }
        }
    }

    let session = Session {
        output: args
            .output
            .clone()
            .unwrap_or_else(|| io::default_export_path(&args.image)),
        release_events: supports_keyboard_enhancement().unwrap_or(false),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if session.release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(
        image = %args.image.display(),
        release_events = session.release_events,
        "session started"
    );

    // Main loop
    let res = run_app(&mut terminal, &mut app, &session);

    // Restore terminal
    if session.release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        error!(error = %e, "terminal loop failed");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, session: &Session) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(app, session, key),
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let area = ui::canvas_area(Rect::new(0, 0, size.width, size.height));
                    let view = ui::CanvasView::new(area, app.surface.image_size());
                    handle_mouse(app, &view, mouse);
                }
                _ => {}
            }
        }

        app.poll(Instant::now());

        for event in app.drain_events() {
            debug!(?event, "surface event");
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, session: &Session, key: event::KeyEvent) {
    let Some(event) = translate_key(key) else {
        return;
    };

    if event.phase == Phase::Down {
        // Clear status on any key
        app.clear_status();
    }

    let now = Instant::now();
    let request = app.handle_key(event, now);

    // Without release reports a held key never ends, so end it right away
    if !session.release_events && event.phase == Phase::Down && event.key.is_delete() {
        app.handle_key(KeyEvent { phase: Phase::Up, ..event }, now);
    }

    if let Some(request) = request {
        handle_request(app, session, request);
    }
}

fn handle_request(app: &mut App, session: &Session, request: HostRequest) {
    match request {
        HostRequest::Copy(text) => match io::copy_to_clipboard(&text) {
            Ok(()) => app.set_status(&format!("Copied {} characters", text.chars().count())),
            Err(e) => {
                warn!(error = %e, "copy failed");
                app.set_status(&format!("Copy failed: {:#}", e));
            }
        },
        HostRequest::Export => match io::export_annotations(app, &session.output) {
            Ok(()) => app.set_status(&format!("Exported to {}", session.output.display())),
            Err(e) => {
                warn!(error = %e, "export failed");
                app.set_status(&format!("Export failed: {:#}", e));
            }
        },
        HostRequest::Quit => app.running = false,
    }
}

fn handle_mouse(app: &mut App, view: &ui::CanvasView, mouse: MouseEvent) {
    let modifiers = translate_modifiers(mouse.modifiers);
    let (button, phase) = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => (Button::Primary, Phase::Down),
        MouseEventKind::Down(MouseButton::Right) => (Button::Secondary, Phase::Down),
        MouseEventKind::Up(MouseButton::Left) => (Button::Primary, Phase::Up),
        MouseEventKind::Up(MouseButton::Right) => (Button::Secondary, Phase::Up),
        MouseEventKind::Drag(MouseButton::Left) => (Button::Primary, Phase::Move),
        _ => return,
    };

    // Presses must land on the image; drags and releases stick to its edge
    let position = match phase {
        Phase::Down => match view.cell_to_image(mouse.column, mouse.row) {
            Some(p) => p,
            None => return,
        },
        Phase::Move | Phase::Up => view.clamped(mouse.column, mouse.row),
    };

    app.handle_pointer(
        PointerEvent::new(position.x, position.y, button, phase).with_modifiers(modifiers),
    );
}

fn translate_modifiers(modifiers: KeyModifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.contains(KeyModifiers::SHIFT),
        alt: modifiers.contains(KeyModifiers::ALT),
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
    }
}

fn translate_key(key: event::KeyEvent) -> Option<KeyEvent> {
    let phase = match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => Phase::Down,
        KeyEventKind::Release => Phase::Up,
    };

    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Escape,
        KeyCode::F(n) => Key::F(n),
        KeyCode::Modifier(_) => return None,
        _ => Key::Other,
    };

    Some(KeyEvent {
        key: code,
        modifiers: translate_modifiers(key.modifiers),
        phase,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use marquee_core::{Extent, Geometry, MarkerId};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> event::KeyEvent {
        event::KeyEvent::new(code, modifiers)
    }

    fn release(code: KeyCode) -> event::KeyEvent {
        event::KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn session(release_events: bool) -> Session {
        Session {
            output: PathBuf::from("unused.tlf"),
            release_events,
        }
    }

    #[test]
    fn test_translate_key() {
        let ev = translate_key(press(KeyCode::Backspace, KeyModifiers::ALT)).unwrap();
        assert_eq!(ev, KeyEvent::down(Key::Backspace).with_modifiers(Modifiers::ALT));

        let ev = translate_key(release(KeyCode::Delete)).unwrap();
        assert_eq!(ev, KeyEvent::up(Key::Delete));

        let ev = translate_key(press(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(ev, KeyEvent::down(Key::Char('s')).with_modifiers(Modifiers::CTRL));

        let ev = translate_key(press(KeyCode::Home, KeyModifiers::NONE)).unwrap();
        assert_eq!(ev.key, Key::Other);
    }

    #[test]
    fn test_mouse_drag_creates_marker() {
        let mut app = App::new();
        app.surface.set_image_size(400.0, 200.0);
        let view = ui::CanvasView::new(Rect::new(0, 0, 40, 20), Extent::new(400.0, 200.0));

        handle_mouse(&mut app, &view, mouse(MouseEventKind::Down(MouseButton::Left), 1, 1));
        handle_mouse(&mut app, &view, mouse(MouseEventKind::Drag(MouseButton::Left), 5, 4));
        handle_mouse(&mut app, &view, mouse(MouseEventKind::Up(MouseButton::Left), 5, 4));

        assert_eq!(app.surface.markers().len(), 1);
        let g = app.surface.markers()[0].geometry;
        assert_eq!(g, Geometry::new(15.0, 15.0, 40.0, 30.0));
    }

    #[test]
    fn test_press_outside_canvas_is_ignored() {
        let mut app = App::new();
        let view = ui::CanvasView::new(Rect::new(1, 2, 40, 20), Extent::new(400.0, 200.0));
        handle_mouse(&mut app, &view, mouse(MouseEventKind::Down(MouseButton::Left), 0, 0));
        assert!(app.surface.drag().is_none());
    }

    #[test]
    fn test_synthetic_release_without_enhancement() {
        let mut app = App::new();
        app.handle_pointer(PointerEvent::down(0.0, 0.0));
        app.handle_pointer(PointerEvent::up(20.0, 20.0));
        app.advance_to_next_marker();
        assert_eq!(app.selected_id(), MarkerId(1));

        let legacy = session(false);
        for c in "abc".chars() {
            handle_key(&mut app, &legacy, press(KeyCode::Char(c), KeyModifiers::NONE));
        }
        handle_key(&mut app, &legacy, press(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.active_text(), "ab");
        assert!(!app.text.is_repeating());

        let modern = session(true);
        handle_key(&mut app, &modern, press(KeyCode::Backspace, KeyModifiers::NONE));
        assert!(app.text.is_repeating());
        handle_key(&mut app, &modern, release(KeyCode::Backspace));
        assert!(!app.text.is_repeating());
        assert_eq!(app.active_text(), "a");
    }

    #[test]
    fn test_quit_request_stops_loop() {
        let mut app = App::new();
        handle_key(&mut app, &session(true), press(KeyCode::Esc, KeyModifiers::NONE));
        assert!(!app.running);
    }
}
