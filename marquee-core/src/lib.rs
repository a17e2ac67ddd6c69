//! Marquee Core - Platform-agnostic image region annotation library
//!
//! This crate provides the data model and interaction logic for drawing
//! labeled rectangle and ellipse markers over an image, attaching text to
//! each one and exporting the result. Front ends supply pointer and key
//! events and a [`Canvas`] to draw on.

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod input;
pub mod ledger;
pub mod model;
pub mod render;
pub mod surface;
pub mod text_edit;

pub use app::{App, HostRequest, ImageInfo, Mode};
pub use config::{Config, PaletteConfig};
pub use error::{Error, Result};
pub use event::SurfaceEvent;
pub use export::{export, from_tlf, import, to_tlf, ExportFormat};
pub use input::{Button, Key, KeyEvent, Modifiers, Phase, PointerEvent};
pub use ledger::ClickOrderLedger;
pub use model::{Annotations, Entry, Extent, Geometry, Marker, MarkerId, Point, Shape};
pub use render::{
    draw_marker, draw_surface, hex_to_color, Canvas, ColorPair, LabelNumbering, Palette, Rgb,
    TextMetrics,
};
pub use surface::{AnnotationSurface, IdAllocator, SurfaceState, ToolSettings};
pub use text_edit::{DeleteMode, TextEditSession};
