use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::SurfaceEvent;
use crate::export::{self, ExportFormat};
use crate::input::{Key, KeyEvent, Phase, PointerEvent};
use crate::model::{Annotations, Marker, MarkerId, Shape};
use crate::render::{self, Canvas, Palette};
use crate::surface::AnnotationSurface;
use crate::text_edit::{DeleteMode, TextEditSession};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
}

/// Work the core cannot do itself and hands back to the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Put this text on the system clipboard
    Copy(String),
    /// Write the export file
    Export,
    Quit,
}

/// Pixel dimensions of the loaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Platform-agnostic application state
pub struct App {
    pub surface: AnnotationSurface,
    pub annotations: Annotations,
    pub text: TextEditSession,
    pub config: Config,
    pub palette: Palette,
    pub image: Option<ImageInfo>,
    pub mode: Mode,
    pub running: bool,

    // Status message
    pub status_message: Option<String>,

    events: VecDeque<SurfaceEvent>,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut surface = AnnotationSurface::new();
        surface.tool = config.tool;
        surface.set_min_drag_area(config.min_drag_area);

        Self {
            surface,
            annotations: Annotations::new(),
            text: TextEditSession::with_interval(config.repeat_interval()),
            palette: config.palette.resolve(),
            config,
            image: None,
            mode: Mode::Normal,
            running: true,
            status_message: None,
            events: VecDeque::new(),
        }
    }

    /// Start over on a new image. Marker ids keep counting.
    pub fn load_image(&mut self, image: ImageInfo) {
        self.surface.clear();
        self.surface
            .set_image_size(f64::from(image.width), f64::from(image.height));
        self.annotations.clear();
        self.text.end();
        info!(name = %image.name, width = image.width, height = image.height, "image loaded");
        self.image = Some(image);
    }

    /// Replace all markers with previously exported ones
    pub fn load_annotations(&mut self, annotations: Annotations) {
        self.surface.clear();
        for (id, entry) in annotations.iter() {
            self.surface
                .insert_marker(Marker::new(id, entry.geometry, Shape::Rectangle, false));
        }
        self.annotations = annotations;
        self.text.end();
        self.events.push_back(SurfaceEvent::deselected());
        debug!(markers = self.surface.markers().len(), "annotations restored");
    }

    pub fn selected_id(&self) -> MarkerId {
        self.surface.selected_id()
    }

    /// Text of the selected marker
    pub fn active_text(&self) -> &str {
        self.text.text()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if let Some(ev) = self.surface.handle_pointer(event) {
            self.apply(ev);
        }
    }

    /// Feed one key event through the keyboard protocol
    pub fn handle_key(&mut self, event: KeyEvent, now: Instant) -> Option<HostRequest> {
        match event.phase {
            Phase::Up => {
                if event.key.is_delete() {
                    self.text.delete_up();
                }
                None
            }
            Phase::Move => None,
            Phase::Down if self.mode == Mode::Help => {
                self.mode = Mode::Normal;
                None
            }
            Phase::Down => self.handle_key_down(event, now),
        }
    }

    fn handle_key_down(&mut self, event: KeyEvent, now: Instant) -> Option<HostRequest> {
        let mods = event.modifiers;
        match event.key {
            Key::Tab => self.advance_to_next_marker(),
            Key::Backspace | Key::Delete if mods.alt => self.remove_selected(),
            Key::Backspace | Key::Delete => {
                let mode = if mods.ctrl {
                    DeleteMode::Word
                } else {
                    DeleteMode::Char
                };
                self.delete_text(mode, now);
            }
            Key::Enter => self.type_char('\n'),
            Key::Char('c') if mods.ctrl => return self.copy_request(),
            Key::Char('s') if mods.ctrl => return Some(HostRequest::Export),
            Key::Char('q') if mods.ctrl => return Some(HostRequest::Quit),
            Key::Char('z') if mods.ctrl => {
                let res = self.undo();
                self.report(res);
            }
            Key::Char('y') if mods.ctrl => {
                let res = self.redo();
                self.report(res);
            }
            Key::Char(_) if mods.ctrl || mods.alt => {}
            Key::Char(c) => self.type_char(c),
            Key::F(1) => self.mode = Mode::Help,
            Key::F(2) => self.toggle_fill(),
            Key::F(3) => self.toggle_shape(),
            Key::Escape => return Some(HostRequest::Quit),
            Key::F(_) | Key::Other => {}
        }
        None
    }

    /// Fire any delete-repeat ticks due by `now`
    pub fn poll(&mut self, now: Instant) {
        let text = self.text.poll(now).map(str::to_string);
        self.text_changed(text);
    }

    /// When the host should next call `poll`
    pub fn next_deadline(&self) -> Option<Instant> {
        self.text.next_deadline()
    }

    pub fn advance_to_next_marker(&mut self) {
        if let Some(ev) = self.surface.advance_to_next_marker() {
            self.apply(ev);
        }
    }

    pub fn remove_selected(&mut self) {
        if let Some(removal) = self.surface.remove_selected() {
            let removed = removal.removed;
            for ev in removal.into_events() {
                self.apply(ev);
            }
            self.set_status(&format!("Removed marker {}", removed));
        }
    }

    pub fn type_char(&mut self, c: char) {
        let text = self.text.push_char(c).map(str::to_string);
        self.text_changed(text);
    }

    pub fn delete_text(&mut self, mode: DeleteMode, now: Instant) {
        let text = self.text.delete_down(mode, now).map(str::to_string);
        self.text_changed(text);
    }

    /// Text to copy, if a marker is selected and has any
    pub fn copy_request(&self) -> Option<HostRequest> {
        if self.selected_id().is_none() || self.active_text().is_empty() {
            return None;
        }
        Some(HostRequest::Copy(self.active_text().to_string()))
    }

    pub fn toggle_fill(&mut self) {
        self.surface.tool.fill_enabled = !self.surface.tool.fill_enabled;
        let state = if self.surface.tool.fill_enabled { "on" } else { "off" };
        self.set_status(&format!("Fill {}", state));
    }

    pub fn toggle_shape(&mut self) {
        self.surface.tool.ellipse_by_default = !self.surface.tool.ellipse_by_default;
        let shape = self.surface.tool.shape_for(Default::default());
        self.set_status(&format!("Drawing {}s", shape.as_str().to_lowercase()));
    }

    pub fn undo(&mut self) -> Result<()> {
        Err(Error::Unsupported("undo"))
    }

    pub fn redo(&mut self) -> Result<()> {
        Err(Error::Unsupported("redo"))
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export::export(&self.annotations, format)
    }

    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        render::draw_surface(canvas, &self.surface, &self.palette, self.config.label_numbering);
    }

    /// Take every notification raised since the last call
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.drain(..).collect()
    }

    /// Keep annotations and the text session in step with a surface event, then queue it
    fn apply(&mut self, event: SurfaceEvent) {
        match &event {
            SurfaceEvent::MarkerCreated { id, geometry } => {
                self.annotations.ensure(*id, *geometry);
            }
            SurfaceEvent::ActiveMarkerChanged { id, geometry } => {
                self.annotations.ensure(*id, *geometry);
                self.text.begin(*id, self.annotations.text(*id));
            }
            SurfaceEvent::ActiveTextChanged { id, text } => {
                self.annotations.set_text(*id, text.as_str());
            }
            SurfaceEvent::MarkerRemoved { id } => {
                self.annotations.remove(*id);
            }
        }
        self.events.push_back(event);
    }

    fn text_changed(&mut self, text: Option<String>) {
        if let Some(text) = text {
            let id = self.text.active_id();
            self.apply(SurfaceEvent::ActiveTextChanged { id, text });
        }
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "operation failed");
            self.set_status(&e.to_string());
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    /// Clear status message
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Get title for display
    pub fn title(&self) -> String {
        self.image
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "No image".to_string())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn app_with_markers(count: usize) -> App {
        let mut app = App::new();
        app.load_image(ImageInfo {
            name: "test.png".to_string(),
            width: 400,
            height: 300,
        });
        for i in 0..count {
            let x = i as f64 * 50.0;
            app.handle_pointer(PointerEvent::down(x, 0.0));
            app.handle_pointer(PointerEvent::up(x + 20.0, 20.0));
        }
        app.drain_events();
        app
    }

    fn key(app: &mut App, k: Key, mods: Modifiers) -> Option<HostRequest> {
        let now = Instant::now();
        let req = app.handle_key(KeyEvent::down(k).with_modifiers(mods), now);
        app.handle_key(KeyEvent::up(k).with_modifiers(mods), now);
        req
    }

    #[test]
    fn test_typing_requires_selection() {
        let mut app = app_with_markers(1);
        key(&mut app, Key::Char('a'), Modifiers::NONE);
        assert!(app.drain_events().is_empty());

        key(&mut app, Key::Tab, Modifiers::NONE);
        key(&mut app, Key::Char('h'), Modifiers::NONE);
        key(&mut app, Key::Char('i'), Modifiers::NONE);
        key(&mut app, Key::Enter, Modifiers::NONE);
        assert_eq!(app.annotations.text(MarkerId(1)), "hi\n");

        let events = app.drain_events();
        assert_eq!(
            events.last(),
            Some(&SurfaceEvent::ActiveTextChanged {
                id: MarkerId(1),
                text: "hi\n".to_string()
            })
        );
    }

    #[test]
    fn test_text_follows_selection() {
        let mut app = app_with_markers(2);
        key(&mut app, Key::Tab, Modifiers::NONE);
        key(&mut app, Key::Char('a'), Modifiers::NONE);
        key(&mut app, Key::Tab, Modifiers::NONE);
        key(&mut app, Key::Char('b'), Modifiers::NONE);
        key(&mut app, Key::Tab, Modifiers::NONE);
        assert_eq!(app.selected_id(), MarkerId(1));
        assert_eq!(app.active_text(), "a");
    }

    #[test]
    fn test_alt_delete_removes_marker_and_entry() {
        let mut app = app_with_markers(2);
        key(&mut app, Key::Tab, Modifiers::NONE);
        key(&mut app, Key::Tab, Modifiers::NONE);
        app.drain_events();

        key(&mut app, Key::Delete, Modifiers::ALT);
        assert!(!app.annotations.contains(MarkerId(2)));
        assert_eq!(app.selected_id(), MarkerId(1));
        let events = app.drain_events();
        assert_eq!(events[0], SurfaceEvent::MarkerRemoved { id: MarkerId(2) });
    }

    #[test]
    fn test_copy_request() {
        let mut app = app_with_markers(1);
        assert_eq!(key(&mut app, Key::Char('c'), Modifiers::CTRL), None);
        key(&mut app, Key::Tab, Modifiers::NONE);
        assert_eq!(key(&mut app, Key::Char('c'), Modifiers::CTRL), None);
        key(&mut app, Key::Char('x'), Modifiers::NONE);
        assert_eq!(
            key(&mut app, Key::Char('c'), Modifiers::CTRL),
            Some(HostRequest::Copy("x".to_string()))
        );
    }

    #[test]
    fn test_undo_is_unsupported() {
        let mut app = App::new();
        assert!(matches!(app.undo(), Err(Error::Unsupported("undo"))));
        key(&mut app, Key::Char('z'), Modifiers::CTRL);
        assert_eq!(app.status_message.as_deref(), Some("undo is not supported yet"));
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = App::new();
        key(&mut app, Key::F(1), Modifiers::NONE);
        assert_eq!(app.mode, Mode::Help);
        assert_eq!(key(&mut app, Key::Escape, Modifiers::NONE), None);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(key(&mut app, Key::Escape, Modifiers::NONE), Some(HostRequest::Quit));
    }

    #[test]
    fn test_load_annotations_with_largest_id() {
        let mut app = app_with_markers(0);
        let restored = export::from_tlf("4294967294:edge\n\n4294967294{0,0}/{10,10};").unwrap();
        app.load_annotations(restored);

        key(&mut app, Key::Tab, Modifiers::NONE);
        assert_eq!(app.selected_id(), MarkerId::MAX);
        assert_eq!(app.active_text(), "edge");

        assert!(export::from_tlf("4294967295:big\n\n4294967295{0,0}/{10,10};").is_err());
    }

    #[test]
    fn test_load_annotations_restores_markers() {
        let mut app = app_with_markers(0);
        let restored = export::from_tlf("3:three\n\n3{0,0}/{10,10};").unwrap();
        app.load_annotations(restored);
        assert_eq!(app.surface.markers().len(), 1);
        assert_eq!(app.surface.next_id(), MarkerId(4));

        key(&mut app, Key::Tab, Modifiers::NONE);
        assert_eq!(app.active_text(), "three");
    }
}
