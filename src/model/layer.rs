//! Layers and their drawable elements.

use super::Stroke;
use serde::{Deserialize, Serialize};

/// An ordered drawing surface within a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Optional user-visible name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Hidden layers are kept but not rendered
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Elements in back-to-front order
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    /// Create an empty visible layer.
    pub fn new() -> Self {
        Self {
            name: None,
            visible: true,
            elements: Vec::new(),
        }
    }

    /// Create an empty visible layer with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Append an element on top of the existing ones.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Append a stroke on top of the existing elements.
    pub fn push_stroke(&mut self, stroke: Stroke) {
        self.elements.push(Element::Stroke(stroke));
    }

    /// Iterate over the strokes of this layer in order.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.elements.iter().map(|element| match element {
            Element::Stroke(stroke) => stroke,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the layer has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

/// A drawable element on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// A vector stroke
    Stroke(Stroke),
}

impl Element {
    /// The stroke, if this element is one.
    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Element::Stroke(stroke) => Some(stroke),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, StrokeTool};

    #[test]
    fn test_layer_append_order() {
        let mut layer = Layer::new();
        assert!(layer.is_empty());

        let mut first = Stroke::new(StrokeTool::Pen);
        first.push_point(Point::new(0.0, 0.0));
        let mut second = Stroke::new(StrokeTool::Highlighter);
        second.push_point(Point::new(1.0, 1.0));

        layer.push_stroke(first);
        layer.push(Element::Stroke(second));

        let tools: Vec<_> = layer.strokes().map(|s| s.tool).collect();
        assert_eq!(tools, vec![StrokeTool::Pen, StrokeTool::Highlighter]);
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn test_layer_visible_defaults_on_deserialize() {
        let layer: Layer = serde_json::from_str(r#"{"elements": []}"#).unwrap();
        assert!(layer.visible);
        assert!(layer.name.is_none());
    }
}
