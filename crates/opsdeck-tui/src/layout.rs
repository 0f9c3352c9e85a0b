//! Screen geometry: A pure function of terminal size.
//!
//! ```text
//!  header (2 rows, full width)
//!  left panel          | right panel
//!  bottom panel (full width)
//! ```
//!
//! Sizes below the minimum are laid out as if they were the minimum;
//! the renderer clips the result against the real frame.

use opsdeck_core::SourceId;
use ratatui::layout::Rect;

/// Columns left free right of each top panel.
pub const MARGIN: u16 = 1;
pub const HEADER_HEIGHT: u16 = 2;
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 12;

/// The four regions of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Rect,
    pub left: Rect,
    pub right: Rect,
    pub bottom: Rect,
}

impl ScreenLayout {
    /// Compute the layout for a `width` × `height` terminal.
    pub fn compute(width: u16, height: u16) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);

        let body = height - HEADER_HEIGHT;
        let top_height = body / 2;
        let bottom_height = body - top_height;
        let half = width / 2;

        let layout = Self {
            header: Rect::new(0, 0, width, HEADER_HEIGHT),
            left: Rect::new(0, HEADER_HEIGHT, half - MARGIN, top_height),
            right: Rect::new(half, HEADER_HEIGHT, width - half - MARGIN, top_height),
            bottom: Rect::new(0, HEADER_HEIGHT + top_height, width, bottom_height),
        };
        debug_assert!(layout.is_disjoint(), "overlapping panels: {layout:?}");
        layout
    }

    pub fn rects(&self) -> [Rect; 4] {
        [self.header, self.left, self.right, self.bottom]
    }

    /// True if no two regions share a cell.
    pub fn is_disjoint(&self) -> bool {
        let rects = self.rects();
        rects.iter().enumerate().all(|(i, a)| {
            rects
                .iter()
                .skip(i + 1)
                .all(|b| a.is_empty() || b.is_empty() || !a.intersects(*b))
        })
    }

    /// The three bordered panels in drawing order.
    pub fn panels(&self) -> [Panel; 3] {
        [
            Panel {
                title: "Builds",
                rect: self.left,
                sources: &[SourceId::Github],
            },
            Panel {
                title: "Deployments",
                rect: self.right,
                sources: &[SourceId::Vercel, SourceId::Netlify],
            },
            Panel {
                title: "Device & Network",
                rect: self.bottom,
                sources: &[SourceId::Device, SourceId::Network],
            },
        ]
    }
}

/// A titled region bound to the sources whose lines it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    pub title: &'static str,
    pub rect: Rect,
    pub sources: &'static [SourceId],
}
