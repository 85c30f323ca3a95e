//! Document model types for handwritten notes.
//!
//! A [`Document`] owns [`Page`]s; each page has a [`Background`] and one or
//! more [`Layer`]s holding vector [`Stroke`]s. All coordinates are page
//! points with a top-left origin.

mod document;
mod layer;
mod page;
mod point;
mod stroke;

pub use document::{Document, Metadata};
pub use layer::{Element, Layer};
pub use page::{
    Background, Page, RulingStyle, A4_HEIGHT, A4_WIDTH, LETTER_HEIGHT, LETTER_WIDTH,
};
pub use point::{normalize_pressure, Point};
pub use stroke::{Color, Stroke, StrokeTool};
