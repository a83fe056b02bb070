//! Column detection on a binarized page.
//!
//! The page is cut into horizontal strips at runs of blank rows, each strip is
//! cut into vertical bands at low-ink gutters, bands are cut again at their
//! own blank rows, and every piece is tightened to its ink. Pieces that share
//! a column are merged into one region per column, read left to right. When
//! the horizontal extents do not sort cleanly into columns the whole page
//! falls back to top-to-bottom order over the individual pieces.

use serde::Serialize;

// ── Tuning ──────────────────────────────────────────────────────────────────

/// A row is blank when at most this fraction of its pixels are ink.
const BLANK_ROW_FRACTION: f64 = 0.002;
/// A column inside a strip is a gutter candidate at or below this ink fraction.
const GUTTER_INK_FRACTION: f64 = 0.01;
/// Blank rows needed to separate two strips, as a fraction of page height.
const STRIP_GAP_FRACTION: u32 = 150;
const MIN_STRIP_GAP: usize = 3;
/// Gutter width needed to separate two bands, as a fraction of page width.
const GUTTER_WIDTH_FRACTION: u32 = 40;
const MIN_GUTTER_WIDTH: usize = 4;
/// Horizontal overlap (relative to the narrower region) that makes two
/// regions the same column. Anything between zero and this is ambiguous.
const SAME_COLUMN_OVERLAP: f64 = 0.5;
/// Margin added around each region before it is cropped for recognition.
const REGION_PADDING: u32 = 4;

// ── Types ───────────────────────────────────────────────────────────────────

/// Binary ink mask, row-major.
#[derive(Debug, Clone)]
pub struct InkMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl InkMask {
    pub fn new(width: u32, height: u32, bits: Vec<bool>) -> Self {
        debug_assert_eq!(bits.len(), (width as usize) * (height as usize));
        Self { width, height, bits }
    }

    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![false; (width as usize) * (height as usize)])
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    pub fn ink_count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    fn row_ink(&self, y: u32, x0: u32, x1: u32) -> u32 {
        let start = (y * self.width) as usize;
        self.bits[start + x0 as usize..start + x1 as usize]
            .iter()
            .filter(|b| **b)
            .count() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Shared horizontal extent in pixels; zero or negative when disjoint.
    fn horizontal_overlap(&self, other: &BoundingBox) -> i64 {
        i64::from(self.right().min(other.right())) - i64::from(self.left.max(other.left))
    }

    fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let narrower = self.width.min(other.width).max(1);
        self.horizontal_overlap(other).max(0) as f64 / f64::from(narrower)
    }

    fn padded(&self, width: u32, height: u32) -> BoundingBox {
        let left = self.left.saturating_sub(REGION_PADDING);
        let top = self.top.saturating_sub(REGION_PADDING);
        let right = (self.right() + REGION_PADDING).min(width);
        let bottom = (self.bottom() + REGION_PADDING).min(height);
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingOrder {
    /// Leftmost column first, top to bottom within each column.
    ColumnMajor,
    /// Fallback for ambiguous layouts: every region by its top edge.
    TopToBottom,
}

/// Detected regions in reading order, padded for cropping.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub boxes: Vec<BoundingBox>,
    pub order: ReadingOrder,
}

// ── Detection ───────────────────────────────────────────────────────────────

pub fn detect_regions(mask: &InkMask) -> PageLayout {
    let (width, height) = (mask.width, mask.height);
    let raw = segment(mask);
    let (ordered, order) = rank_regions(raw);
    PageLayout {
        boxes: ordered.iter().map(|b| b.padded(width, height)).collect(),
        order,
    }
}

/// XY-cut: strips at blank rows, then bands at gutters, each tightened to ink.
fn segment(mask: &InkMask) -> Vec<BoundingBox> {
    if mask.width == 0 || mask.height == 0 {
        return Vec::new();
    }

    let row_profile: Vec<u32> = (0..mask.height)
        .map(|y| mask.row_ink(y, 0, mask.width))
        .collect();
    let row_blank = (f64::from(mask.width) * BLANK_ROW_FRACTION) as u32;
    let strip_gap = ((mask.height / STRIP_GAP_FRACTION) as usize).max(MIN_STRIP_GAP);
    let gutter = ((mask.width / GUTTER_WIDTH_FRACTION) as usize).max(MIN_GUTTER_WIDTH);

    let mut boxes = Vec::new();
    for (y0, y1) in runs(&row_profile, row_blank, strip_gap) {
        let (y0, y1) = (y0 as u32, y1 as u32);
        let col_profile: Vec<u32> = (0..mask.width)
            .map(|x| (y0..y1).filter(|&y| mask.is_ink(x, y)).count() as u32)
            .collect();
        let col_blank = (f64::from(y1 - y0) * GUTTER_INK_FRACTION) as u32;

        for (x0, x1) in runs(&col_profile, col_blank, gutter) {
            let (x0, x1) = (x0 as u32, x1 as u32);
            // A band can still hold blocks that the other columns kept in one strip.
            let band_profile: Vec<u32> = (y0..y1).map(|y| mask.row_ink(y, x0, x1)).collect();
            let band_blank = (f64::from(x1 - x0) * BLANK_ROW_FRACTION) as u32;
            for (by0, by1) in runs(&band_profile, band_blank, strip_gap) {
                let (by0, by1) = (y0 + by0 as u32, y0 + by1 as u32);
                if let Some(bbox) = tighten(mask, x0, x1, by0, by1) {
                    boxes.push(bbox);
                }
            }
        }
    }
    boxes
}

/// Half-open runs of "inked" entries (above `blank_max`) in `profile`, merging
/// runs separated by fewer than `min_gap` blank entries.
fn runs(profile: &[u32], blank_max: u32, min_gap: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (i, &ink) in profile.iter().enumerate() {
        if ink <= blank_max {
            continue;
        }
        current = match current {
            Some((start, end)) if i - end < min_gap => Some((start, i + 1)),
            Some(done) => {
                out.push(done);
                Some((i, i + 1))
            }
            None => Some((i, i + 1)),
        };
    }
    out.extend(current);
    out
}

/// Shrink a band to the rows and columns that actually carry ink.
fn tighten(mask: &InkMask, x0: u32, x1: u32, y0: u32, y1: u32) -> Option<BoundingBox> {
    let top = (y0..y1).find(|&y| mask.row_ink(y, x0, x1) > 0)?;
    let bottom = (y0..y1).rev().find(|&y| mask.row_ink(y, x0, x1) > 0)?;
    let left = (x0..x1).find(|&x| (top..=bottom).any(|y| mask.is_ink(x, y)))?;
    let right = (x0..x1).rev().find(|&x| (top..=bottom).any(|y| mask.is_ink(x, y)))?;
    Some(BoundingBox {
        left,
        top,
        width: right - left + 1,
        height: bottom - top + 1,
    })
}

// ── Ranking ─────────────────────────────────────────────────────────────────

/// One region per column, leftmost first, or every box top-to-bottom when
/// the columns are ambiguous.
pub fn rank_regions(boxes: Vec<BoundingBox>) -> (Vec<BoundingBox>, ReadingOrder) {
    let n = boxes.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            let ratio = boxes[i].overlap_ratio(&boxes[j]);
            if ratio >= SAME_COLUMN_OVERLAP {
                union(&mut parent, i, j);
            } else if ratio > 0.0 {
                return (top_to_bottom(boxes), ReadingOrder::TopToBottom);
            }
        }
    }

    let mut columns: Vec<Vec<BoundingBox>> = Vec::new();
    let mut column_of_root: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let root = find(&mut parent, i);
        let slot = *column_of_root[root].get_or_insert_with(|| {
            columns.push(Vec::new());
            columns.len() - 1
        });
        columns[slot].push(boxes[i]);
    }

    // One region spanning two regions that do not touch each other.
    let bridged = columns.iter().any(|col| {
        col.iter()
            .enumerate()
            .any(|(i, a)| col[i + 1..].iter().any(|b| a.horizontal_overlap(b) <= 0))
    });
    if bridged {
        return (top_to_bottom(boxes), ReadingOrder::TopToBottom);
    }

    let mut merged: Vec<BoundingBox> = columns.iter().filter_map(|col| union_box(col)).collect();
    merged.sort_by_key(|b| b.left);
    (merged, ReadingOrder::ColumnMajor)
}

/// Smallest box covering every member of a column.
fn union_box(boxes: &[BoundingBox]) -> Option<BoundingBox> {
    let left = boxes.iter().map(|b| b.left).min()?;
    let top = boxes.iter().map(|b| b.top).min()?;
    let right = boxes.iter().map(BoundingBox::right).max()?;
    let bottom = boxes.iter().map(BoundingBox::bottom).max()?;
    Some(BoundingBox {
        left,
        top,
        width: right - left,
        height: bottom - top,
    })
}

fn top_to_bottom(mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    boxes.sort_by_key(|b| (b.top, b.left));
    boxes
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = i;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[rb] = ra;
    }
}
