//! Pointer-driven marker creation, selection and navigation

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::event::SurfaceEvent;
use crate::input::{Button, Modifiers, Phase, PointerEvent};
use crate::ledger::ClickOrderLedger;
use crate::model::{Extent, Geometry, Marker, MarkerId, Point, Shape};

/// Drags covering this many square pixels or fewer are treated as clicks
pub const DEFAULT_MIN_DRAG_AREA: f64 = 50.0;

/// Issues sequential marker ids starting at 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// `None` once every id up to `MarkerId::MAX` has been issued
    pub fn next_id(&mut self) -> Option<MarkerId> {
        let id = MarkerId(self.next);
        if !id.is_valid() {
            return None;
        }
        self.next += 1;
        Some(id)
    }

    /// The id the next call to `next_id` will return
    pub fn peek(&self) -> MarkerId {
        MarkerId(self.next)
    }

    /// Make sure `id` is never issued again
    pub fn bump_past(&mut self, id: MarkerId) {
        self.next = self.next.max(id.get().saturating_add(1));
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool state read when a drag starts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolSettings {
    pub fill_enabled: bool,
    pub ellipse_by_default: bool,
}

impl ToolSettings {
    /// Shift inverts the default shape for the marker being drawn
    pub fn shape_for(&self, modifiers: Modifiers) -> Shape {
        let default = if self.ellipse_by_default {
            Shape::Ellipse
        } else {
            Shape::Rectangle
        };
        if modifiers.shift {
            default.toggled()
        } else {
            default
        }
    }
}

/// The rectangle tracked while the primary button is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Un-normalized; the extent follows the pointer and may be negative
    pub geometry: Geometry,
    pub shape: Shape,
    pub filled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Idle,
    Dragging,
    Selected(MarkerId),
}

/// Result of removing the selected marker
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: MarkerId,
    /// Selection change that followed the removal
    pub selection: SurfaceEvent,
}

impl Removal {
    pub fn into_events(self) -> [SurfaceEvent; 2] {
        [
            SurfaceEvent::MarkerRemoved { id: self.removed },
            self.selection,
        ]
    }
}

/// Owns the live markers, the click ledger and the in-progress drag
#[derive(Debug, Clone)]
pub struct AnnotationSurface {
    markers: Vec<Marker>,
    ledger: ClickOrderLedger,
    selected: MarkerId,
    drag: Option<Drag>,
    ids: IdAllocator,
    image_size: Extent,
    min_drag_area: f64,
    pub tool: ToolSettings,
}

impl AnnotationSurface {
    pub fn new() -> Self {
        Self::with_allocator(IdAllocator::new())
    }

    pub fn with_allocator(ids: IdAllocator) -> Self {
        Self {
            markers: Vec::new(),
            ledger: ClickOrderLedger::new(),
            selected: MarkerId::NONE,
            drag: None,
            ids,
            image_size: Extent::ZERO,
            min_drag_area: DEFAULT_MIN_DRAG_AREA,
            tool: ToolSettings::default(),
        }
    }

    pub fn set_image_size(&mut self, width: f64, height: f64) {
        self.image_size = Extent::new(width, height);
    }

    pub fn image_size(&self) -> Extent {
        self.image_size
    }

    pub fn set_min_drag_area(&mut self, area: f64) {
        self.min_drag_area = area;
    }

    pub fn min_drag_area(&self) -> f64 {
        self.min_drag_area
    }

    pub fn state(&self) -> SurfaceState {
        if self.drag.is_some() {
            SurfaceState::Dragging
        } else if self.selected.is_some() {
            SurfaceState::Selected(self.selected)
        } else {
            SurfaceState::Idle
        }
    }

    /// Markers in creation order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn selected_id(&self) -> MarkerId {
        self.selected
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.marker(self.selected)
    }

    pub fn ledger(&self) -> &ClickOrderLedger {
        &self.ledger
    }

    pub fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }

    pub fn next_id(&self) -> MarkerId {
        self.ids.peek()
    }

    /// Feed one pointer event through the state machine
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        match (event.button, event.phase) {
            (Button::Primary, Phase::Down) => {
                self.begin_drag(event.position, event.modifiers);
                None
            }
            (_, Phase::Move) => {
                self.update_drag(event.position);
                None
            }
            (Button::Primary, Phase::Up) => self.end_drag(event.position),
            (Button::Secondary, Phase::Down) => {
                let hits = self.hit_test(event.position);
                debug!(x = event.position.x, y = event.position.y, ?hits, "secondary click");
                None
            }
            (Button::Secondary, Phase::Up) => None,
        }
    }

    fn begin_drag(&mut self, at: Point, modifiers: Modifiers) {
        if self.drag.is_some() {
            return;
        }
        self.drag = Some(Drag {
            geometry: Geometry::at(at),
            shape: self.tool.shape_for(modifiers),
            filled: self.tool.fill_enabled,
        });
    }

    fn update_drag(&mut self, to: Point) {
        if let Some(drag) = self.drag.as_mut() {
            drag.geometry.extent = Extent::new(
                to.x - drag.geometry.origin.x,
                to.y - drag.geometry.origin.y,
            );
            trace!(extent = ?drag.geometry.extent, "drag updated");
        }
    }

    fn end_drag(&mut self, at: Point) -> Option<SurfaceEvent> {
        self.update_drag(at);
        let drag = self.drag.take()?;

        if drag.geometry.area().abs() > self.min_drag_area {
            let Some(id) = self.ids.next_id() else {
                warn!("marker ids exhausted, drag discarded");
                return None;
            };
            let marker = Marker::new(id, drag.geometry, drag.shape, drag.filled);
            let geometry = marker.geometry;
            debug!(%id, ?geometry, shape = marker.shape.as_str(), "committed marker");
            self.markers.push(marker);
            Some(SurfaceEvent::MarkerCreated { id, geometry })
        } else {
            Some(self.click(at))
        }
    }

    /// Ids of every marker strictly containing `p`, in creation order
    pub fn hit_test(&self, p: Point) -> Vec<MarkerId> {
        self.markers
            .iter()
            .filter(|m| m.geometry.contains_point(p))
            .map(|m| m.id)
            .collect()
    }

    /// Select the least recently selected marker under `p`, or deselect on a miss.
    /// Ids never selected sort before every recorded id, so repeated clicks on a stack
    /// visit each member in turn.
    pub fn click(&mut self, p: Point) -> SurfaceEvent {
        let candidate = self
            .markers
            .iter()
            .filter(|m| m.geometry.contains_point(p))
            .min_by_key(|m| self.ledger.position(m.id))
            .map(|m| m.id);

        match candidate {
            Some(id) => self.select(id).unwrap_or_else(|| self.deselect()),
            None => self.deselect(),
        }
    }

    /// Make `id` the only selected marker and move it to the ledger tail
    pub fn select(&mut self, id: MarkerId) -> Option<SurfaceEvent> {
        let geometry = self.marker(id)?.geometry;
        for marker in &mut self.markers {
            marker.selected = marker.id == id;
        }
        self.selected = id;
        self.ledger.record_selection(id);
        debug!(%id, "selected marker");
        Some(SurfaceEvent::ActiveMarkerChanged { id, geometry })
    }

    pub fn deselect(&mut self) -> SurfaceEvent {
        for marker in &mut self.markers {
            marker.selected = false;
        }
        self.selected = MarkerId::NONE;
        SurfaceEvent::deselected()
    }

    /// Select the marker whose id follows the ledger tail, wrapping to the smallest id
    pub fn advance_to_next_marker(&mut self) -> Option<SurfaceEvent> {
        let current = self.ledger.tail().unwrap_or(MarkerId::NONE);
        let successor = current.get().checked_add(1).map(MarkerId);

        let target = match successor {
            Some(id) if self.marker(id).is_some() => id,
            _ => self.markers.iter().map(|m| m.id).min()?,
        };

        self.select(target)
    }

    /// Remove the selected marker and fall back to the previously selected one
    pub fn remove_selected(&mut self) -> Option<Removal> {
        if self.markers.is_empty() || self.selected.is_none() {
            return None;
        }

        let target = self.ledger.tail()?;
        let prev = self.ledger.predecessor_of(target);

        self.ledger.pop_tail();
        self.markers.retain(|m| m.id != target);
        debug!(id = %target, ?prev, "removed marker");

        let selection = match prev {
            Some(prev) if self.marker(prev).is_some() => {
                self.select(prev).unwrap_or_else(|| self.deselect())
            }
            _ => self.deselect(),
        };

        Some(Removal {
            removed: target,
            selection,
        })
    }

    /// Add a marker with a known id, as when restoring an export.
    /// Returns false if the id is out of range or already taken.
    pub fn insert_marker(&mut self, mut marker: Marker) -> bool {
        if !marker.id.is_valid() || self.marker(marker.id).is_some() {
            return false;
        }
        marker.geometry.normalize();
        marker.selected = false;
        self.ids.bump_past(marker.id);
        self.markers.push(marker);
        true
    }

    /// Drop every marker, the ledger and any live drag. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.ledger.clear();
        self.selected = MarkerId::NONE;
        self.drag = None;
    }
}

impl Default for AnnotationSurface {
    fn default() -> Self {
        Self::new()
    }
}
