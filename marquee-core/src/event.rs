use crate::model::{Geometry, MarkerId};

/// Notifications raised for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Selection changed; id 0 with `Geometry::EMPTY` means deselected
    ActiveMarkerChanged { id: MarkerId, geometry: Geometry },
    ActiveTextChanged { id: MarkerId, text: String },
    MarkerCreated { id: MarkerId, geometry: Geometry },
    MarkerRemoved { id: MarkerId },
}

impl SurfaceEvent {
    pub fn deselected() -> Self {
        SurfaceEvent::ActiveMarkerChanged {
            id: MarkerId::NONE,
            geometry: Geometry::EMPTY,
        }
    }
}
