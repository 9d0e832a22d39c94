use image::RgbImage;
use std::fmt;

/// Axis-aligned box in image pixel coordinates.
///
/// Coordinates are signed so that inflated copies may temporarily reach
/// outside the image; `clamp_to` brings them back into the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when the two boxes share interior pixels; touching edges do not count.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlapping part of both boxes, or an empty rectangle when disjoint.
    pub fn intersection(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return Rectangle::default();
        }
        Rectangle::new(x, y, right - x, bottom - y)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rectangle::new(x, y, right - x, bottom - y)
    }

    /// Grow by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inflate(&self, dx: i32, dy: i32) -> Rectangle {
        Rectangle::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        )
    }

    /// Horizontal projection: same size, moved to `y = 0`.
    pub fn flatten(&self) -> Rectangle {
        Rectangle::new(self.x, 0, self.width, self.height)
    }

    /// Intersect with the `width x height` image frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rectangle {
        let max_x = width.min(i32::MAX as u32) as i32;
        let max_y = height.min(i32::MAX as u32) as i32;

        let x = self.x.clamp(0, max_x);
        let y = self.y.clamp(0, max_y);
        let right = self.right().clamp(x, max_x);
        let bottom = self.bottom().clamp(y, max_y);

        Rectangle::new(x, y, right - x, bottom - y)
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 0
            && self.height >= 0
            && self.right() as i64 <= width as i64
            && self.bottom() as i64 <= height as i64
    }

    /// Union of every rectangle in `rects`, `None` for an empty slice.
    pub fn union_all(rects: &[Rectangle]) -> Option<Rectangle> {
        let (first, rest) = rects.split_first()?;
        Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Stacked line boxes believed to form one text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub members: Vec<Rectangle>,
}

impl Group {
    pub fn seeded(seed: Rectangle) -> Self {
        Self { members: vec![seed] }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::union_all(&self.members)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCandidate {
    /// Region that was cropped and recognized
    pub region: Rectangle,
    /// Name line followed by the two address lines
    pub lines: Vec<String>,
}

impl AddressCandidate {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Why a recognized block was not accepted as an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooFewLines,
    DigitInName,
    MalformedStreetLine,
    MalformedCityLine,
    NoPerson,
    NoLocation,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::TooFewLines => "fewer than three lines",
            RejectReason::DigitInName => "name line contains a digit",
            RejectReason::MalformedStreetLine => "street line needs a digit and a letter",
            RejectReason::MalformedCityLine => "city line needs a digit and a letter",
            RejectReason::NoPerson => "no person name in first line",
            RejectReason::NoLocation => "no location in first line",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(AddressCandidate),
    Rejected(RejectReason),
}

/// Result of evaluating one group, kept for the debug overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    pub region: Rectangle,
    pub verdict: Verdict,
}

impl BlockOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted(_))
    }

    pub fn candidate(&self) -> Option<&AddressCandidate> {
        match &self.verdict {
            Verdict::Accepted(candidate) => Some(candidate),
            Verdict::Rejected(_) => None,
        }
    }
}

/// Output of one full run, owned by the caller.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub debug_image: RgbImage,
    pub extracted_text: String,
    pub candidates: Vec<AddressCandidate>,
}
