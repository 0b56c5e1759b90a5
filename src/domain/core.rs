//! Core domain types and operations
//!
//! Screen geometry shared by the selection flow, the saved-rectangle store
//! and the host window. Everything here is in screen pixels and has no
//! knowledge of Win32.

/// Smallest width/height a selection is allowed to have
pub const MIN_SELECTION_SIZE: i32 = 100;

/// Point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in screen coordinates, stored as edges
///
/// This matches the on-disk layout of `saved_rects.txt` and the Win32 `RECT`
/// so conversions in either direction are field-for-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Creates a new rectangle from its edges
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// Builds the rectangle spanned by two corner points, in either order
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Grows the right/bottom edges so the rectangle is at least `min` pixels
    /// in each dimension. The top-left corner never moves.
    pub fn with_min_size(self, min: i32) -> Self {
        let mut rect = self;
        if rect.width() < min {
            rect.right = rect.left.saturating_add(min);
        }
        if rect.height() < min {
            rect.bottom = rect.top.saturating_add(min);
        }
        rect
    }
}

/// Size of the host window's non-client frame
///
/// Used to convert between the client area the user selected and the full
/// window rectangle that has to be positioned to show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameMetrics {
    pub caption_height: i32,
    pub border_width: i32,
    pub border_height: i32,
}

impl FrameMetrics {
    pub fn new(caption_height: i32, border_width: i32, border_height: i32) -> Self {
        Self {
            caption_height,
            border_width,
            border_height,
        }
    }

    /// Window rectangle whose client area covers `client`
    pub fn window_for_client(&self, client: &Rect) -> Rect {
        Rect::new(
            client.left.saturating_sub(self.border_width),
            client.top
                .saturating_sub(self.caption_height)
                .saturating_sub(self.border_height),
            client.right.saturating_add(self.border_width),
            client.bottom.saturating_add(self.border_height),
        )
    }

    /// Client rectangle inside a window rectangle
    pub fn client_for_window(&self, window: &Rect) -> Rect {
        Rect::new(
            window.left.saturating_add(self.border_width),
            window.top
                .saturating_add(self.caption_height)
                .saturating_add(self.border_height),
            window.right.saturating_sub(self.border_width),
            window.bottom.saturating_sub(self.border_height),
        )
    }

    /// Screen area the magnifier should sample for the current window
    ///
    /// `client_origin` is the client rect's own top-left (normally 0,0).
    /// The extra `fudge` pixels keep the window's own frame out of the
    /// sampled image.
    pub fn magnifier_source(&self, window: &Rect, client_origin: Point, fudge: i32) -> Rect {
        let left = [client_origin.x, self.border_width, fudge]
            .into_iter()
            .fold(window.left, i32::saturating_add);
        let top = [client_origin.y, self.caption_height, self.border_height, fudge]
            .into_iter()
            .fold(window.top, i32::saturating_add);
        Rect::from_origin_size(left, top, window.width(), window.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_basic_properties() {
        let rect = Rect::new(10, 20, 110, 70);
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 50);
        assert_eq!(Rect::from_origin_size(10, 20, 100, 50), rect);
    }

    #[test]
    fn from_points_normalizes_any_order() {
        let expected = Rect::new(10, 20, 300, 400);
        assert_eq!(Rect::from_points(Point::new(10, 20), Point::new(300, 400)), expected);
        assert_eq!(Rect::from_points(Point::new(300, 400), Point::new(10, 20)), expected);
        assert_eq!(Rect::from_points(Point::new(10, 400), Point::new(300, 20)), expected);
    }

    #[test]
    fn min_size_clamp_grows_right_and_bottom() {
        let rect = Rect::new(50, 60, 80, 500).with_min_size(MIN_SELECTION_SIZE);
        assert_eq!(rect, Rect::new(50, 60, 150, 500));

        let rect = Rect::new(50, 60, 500, 61).with_min_size(MIN_SELECTION_SIZE);
        assert_eq!(rect, Rect::new(50, 60, 500, 160));

        let big = Rect::new(0, 0, 400, 300);
        assert_eq!(big.with_min_size(MIN_SELECTION_SIZE), big);
    }

    #[test]
    fn frame_conversion_is_reversible() {
        let metrics = FrameMetrics::new(23, 8, 8);
        let client = Rect::new(100, 100, 400, 300);

        let window = metrics.window_for_client(&client);
        assert_eq!(window, Rect::new(92, 69, 408, 308));
        assert_eq!(metrics.client_for_window(&window), client);
    }

    #[test]
    fn extreme_coordinates_saturate() {
        let metrics = FrameMetrics::new(23, 8, 8);
        let window = Rect::new(i32::MAX, 0, i32::MAX, 100);

        let client = metrics.client_for_window(&window);
        assert_eq!(client.left, i32::MAX);
        assert_eq!(client.right, i32::MAX - 8);

        let wide = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(wide.width(), i32::MAX);
        assert_eq!(metrics.window_for_client(&wide).top, i32::MIN);

        let grown = Rect::new(i32::MAX - 10, 0, i32::MAX - 10, 0).with_min_size(MIN_SELECTION_SIZE);
        assert_eq!(grown.right, i32::MAX);

        let source = metrics.magnifier_source(&window, Point::default(), 4);
        assert_eq!(source.left, i32::MAX);
        assert_eq!(source.right, i32::MAX);
    }

    #[test]
    fn magnifier_source_skips_frame_and_fudge() {
        let metrics = FrameMetrics::new(23, 8, 8);
        let window = Rect::new(92, 69, 408, 308);

        let source = metrics.magnifier_source(&window, Point::default(), 4);
        assert_eq!(source.left, 104);
        assert_eq!(source.top, 104);
        assert_eq!(source.width(), window.width());
        assert_eq!(source.height(), window.height());
    }
}
