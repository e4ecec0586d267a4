use std::ops::{Add, Sub};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer position relative to the popup origin when the drag began
    Dragging { offset: Point },
}

/// State of the draggable popup, owned by whoever binds its events.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    position: Point,
    visible: bool,
    drag: DragState,
}

impl Default for Popup {
    fn default() -> Self {
        Self::new(Point::default())
    }
}

impl Popup {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            visible: true,
            drag: DragState::Idle,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Moves the popup without dragging, e.g. after layout placed it.
    pub fn move_to(&mut self, position: Point) {
        self.position = position;
    }

    /// Pointer pressed on the header.
    pub fn press(&mut self, pointer: Point) {
        if self.visible {
            self.drag = DragState::Dragging {
                offset: pointer - self.position,
            };
        }
    }

    /// Pointer moved anywhere on the page; returns the new popup position while dragging.
    pub fn pointer_moved(&mut self, pointer: Point) -> Option<Point> {
        match self.drag {
            DragState::Dragging { offset } => {
                self.position = pointer - offset;
                Some(self.position)
            }
            DragState::Idle => None,
        }
    }

    pub fn release(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.drag = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_pointer_minus_offset() {
        let mut popup = Popup::new(Point::new(100.0, 50.0));

        popup.press(Point::new(130.0, 60.0));
        assert!(popup.is_dragging());

        assert_eq!(popup.pointer_moved(Point::new(200.0, 200.0)), Some(Point::new(170.0, 190.0)));
        assert_eq!(popup.pointer_moved(Point::new(30.0, 10.0)), Some(Point::new(0.0, 0.0)));
        assert_eq!(popup.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_moves_are_ignored_when_not_dragging() {
        let mut popup = Popup::new(Point::new(10.0, 10.0));

        assert_eq!(popup.pointer_moved(Point::new(500.0, 500.0)), None);

        popup.press(Point::new(15.0, 15.0));
        popup.release();
        assert_eq!(popup.pointer_moved(Point::new(500.0, 500.0)), None);
        assert_eq!(popup.position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_close_ends_drag_and_blocks_new_ones() {
        let mut popup = Popup::default();
        popup.press(Point::new(5.0, 5.0));

        popup.close();
        assert!(!popup.is_visible());
        assert!(!popup.is_dragging());

        popup.press(Point::new(5.0, 5.0));
        assert!(!popup.is_dragging());

        popup.open();
        popup.press(Point::new(5.0, 5.0));
        assert!(popup.is_dragging());
    }

    #[test]
    fn test_move_to_rebases_offset() {
        let mut popup = Popup::default();
        popup.move_to(Point::new(40.0, 40.0));
        popup.press(Point::new(50.0, 45.0));

        assert_eq!(popup.pointer_moved(Point::new(60.0, 60.0)), Some(Point::new(50.0, 55.0)));
    }
}
