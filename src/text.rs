//! Text-display primitive seam
//!
//! The widget never renders glyphs itself; it pushes formatted strings into
//! a host text primitive through [`TextDisplay`]. The contract is an
//! imperative "set rendered content" side channel: `set_text` replaces the
//! displayed string without forcing a re-layout of the surrounding tree.
//!
//! [`MergedTextHandle`] fans a single widget out to several display owners
//! (the widget's own handle plus any caller-supplied one), and
//! [`TextBuffer`] is the headless in-memory target used by tests and
//! snapshot tooling.

use std::sync::{Arc, Mutex};

/// Horizontal text alignment, passed through to the rendering primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    Auto,
    Center,
    Justify,
    Left,
    /// Default: numbers are conventionally right-aligned
    #[default]
    Right,
}

/// Style forwarded to the text primitive at mount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    /// Render digits at a fixed width so the text doesn't wobble while
    /// animating. On by default.
    pub tabular_nums: bool,
    pub text_align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            tabular_nums: true,
            text_align: TextAlign::Right,
        }
    }
}

/// A host text primitive the widget renders through
///
/// Implementations must accept `set_text` at animation-tick frequency; the
/// push replaces displayed content only and must not trigger a re-layout.
pub trait TextDisplay: Send + Sync {
    /// Replace the displayed string
    fn set_text(&self, text: &str);

    /// Apply style and alignment
    fn apply_style(&self, style: &TextStyle);

    /// Mark the primitive editable or read-only; the widget always renders
    /// read-only
    fn set_editable(&self, editable: bool);
}

/// Fan-out wrapper exposing one widget to multiple display owners
///
/// Every call is forwarded to all targets in order. The widget merges its
/// internal handle with any external one through this type.
#[derive(Clone, Default)]
pub struct MergedTextHandle {
    targets: Vec<Arc<dyn TextDisplay>>,
}

impl MergedTextHandle {
    pub fn new(targets: Vec<Arc<dyn TextDisplay>>) -> Self {
        Self { targets }
    }

    /// Add another display owner
    pub fn push(&mut self, target: Arc<dyn TextDisplay>) {
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl TextDisplay for MergedTextHandle {
    fn set_text(&self, text: &str) {
        for target in &self.targets {
            target.set_text(text);
        }
    }

    fn apply_style(&self, style: &TextStyle) {
        for target in &self.targets {
            target.apply_style(style);
        }
    }

    fn set_editable(&self, editable: bool) {
        for target in &self.targets {
            target.set_editable(editable);
        }
    }
}

struct TextBufferState {
    history: Vec<String>,
    style: TextStyle,
    editable: bool,
}

/// In-memory [`TextDisplay`] recording everything pushed into it
///
/// Keeps the full push history, which is how tests assert the exact tick
/// sequence of an animation leg.
pub struct TextBuffer {
    state: Mutex<TextBufferState>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TextBufferState {
                history: Vec::new(),
                style: TextStyle::default(),
                editable: true,
            }),
        }
    }

    /// The string currently displayed, if anything was pushed yet
    pub fn current(&self) -> Option<String> {
        self.state.lock().unwrap().history.last().cloned()
    }

    /// Every string pushed so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.state.lock().unwrap().history.clone()
    }

    /// Number of pushes so far
    pub fn push_count(&self) -> usize {
        self.state.lock().unwrap().history.len()
    }

    pub fn style(&self) -> TextStyle {
        self.state.lock().unwrap().style
    }

    pub fn is_editable(&self) -> bool {
        self.state.lock().unwrap().editable
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay for TextBuffer {
    fn set_text(&self, text: &str) {
        self.state.lock().unwrap().history.push(text.to_owned());
    }

    fn apply_style(&self, style: &TextStyle) {
        self.state.lock().unwrap().style = *style;
    }

    fn set_editable(&self, editable: bool) {
        self.state.lock().unwrap().editable = editable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_records_pushes() {
        let buffer = TextBuffer::new();
        assert_eq!(buffer.current(), None);

        buffer.set_text("10");
        buffer.set_text("20");

        assert_eq!(buffer.current(), Some("20".to_string()));
        assert_eq!(buffer.history(), vec!["10", "20"]);
        assert_eq!(buffer.push_count(), 2);
    }

    #[test]
    fn test_buffer_records_style_and_editable() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_editable());

        buffer.apply_style(&TextStyle {
            tabular_nums: false,
            text_align: TextAlign::Center,
        });
        buffer.set_editable(false);

        assert!(!buffer.style().tabular_nums);
        assert_eq!(buffer.style().text_align, TextAlign::Center);
        assert!(!buffer.is_editable());
    }

    #[test]
    fn test_merged_handle_fans_out() {
        let a = Arc::new(TextBuffer::new());
        let b = Arc::new(TextBuffer::new());
        let merged = MergedTextHandle::new(vec![
            a.clone() as Arc<dyn TextDisplay>,
            b.clone() as Arc<dyn TextDisplay>,
        ]);

        merged.set_text("42");
        merged.set_editable(false);

        assert_eq!(a.current(), Some("42".to_string()));
        assert_eq!(b.current(), Some("42".to_string()));
        assert!(!a.is_editable());
        assert!(!b.is_editable());
    }
}
