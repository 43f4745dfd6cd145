//! Display session state shared by the tracks of one view.

use std::collections::BTreeMap;

/// How an axis pointer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPointerStyle {
    /// Follows the cursor in the view being interacted with.
    Active,
    /// Mirrors a pointer from another view.
    Secondary,
}

/// Vertical pointer at a fraction of the track width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPointer {
    pub relative_x: f64,
    pub style: AxisPointerStyle,
}

/// Frame counter and axis pointers for one display session.
///
/// Passed explicitly to every track update.
#[derive(Debug, Default)]
pub struct DisplaySession {
    frame: u64,
    pointers: BTreeMap<String, AxisPointer>,
}

impl DisplaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Starts the next display pass and returns its frame number.
    pub fn advance_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    pub fn set_axis_pointer(&mut self, id: impl Into<String>, relative_x: f64, style: AxisPointerStyle) {
        self.pointers
            .insert(id.into(), AxisPointer { relative_x, style });
    }

    pub fn remove_axis_pointer(&mut self, id: &str) -> Option<AxisPointer> {
        self.pointers.remove(id)
    }

    pub fn axis_pointers(&self) -> impl Iterator<Item = (&str, &AxisPointer)> {
        self.pointers.iter().map(|(id, pointer)| (id.as_str(), pointer))
    }

    /// First active pointer, by id order.
    pub fn primary_pointer(&self) -> Option<&AxisPointer> {
        self.pointers
            .values()
            .find(|pointer| pointer.style == AxisPointerStyle::Active)
    }
}
