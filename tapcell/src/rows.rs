use std::collections::BTreeMap;
use tap_common::db::core::{LayoutDB, Orient};
use tap_common::geom::interval::{self, Span};
use tap_common::geom::point::Point;
use tap_common::geom::rect::Rect;

/// Contiguous stretch of one row that no blockage touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubRow {
    pub x_min: i64,
    pub x_max: i64,
    pub y: i64,
    pub height: i64,
    pub site_width: i64,
    /// X coordinate the site grid of the parent row is anchored at.
    pub grid_origin: i64,
    pub orient: Orient,
}

impl SubRow {
    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn bbox(&self) -> Rect {
        Rect::new(
            Point::new(self.x_min, self.y),
            Point::new(self.x_max, self.y + self.height),
        )
    }

    pub fn span(&self) -> Span {
        (self.x_min, self.x_max)
    }

    /// Clips `span` to this sub-row and snaps it inward onto the site grid.
    pub fn clip(&self, span: Span) -> Option<Span> {
        let lo = interval::snap_up(span.0.max(self.x_min), self.grid_origin, self.site_width);
        let hi = interval::snap_down(span.1.min(self.x_max), self.grid_origin, self.site_width);
        (hi > lo).then_some((lo, hi))
    }
}

/// All sub-rows sharing one Y, ordered by X.
#[derive(Clone, Debug)]
pub struct RowStack {
    pub y: i64,
    pub height: i64,
    pub orient: Orient,
    pub subrows: Vec<SubRow>,
}

impl RowStack {
    pub fn spans(&self) -> Vec<Span> {
        self.subrows.iter().map(SubRow::span).collect()
    }

    /// True when a single sub-row spans all of `[x_min, x_max)`.
    pub fn covers(&self, x_min: i64, x_max: i64) -> bool {
        interval::covered_by(&self.spans(), x_min, x_max)
    }

    pub fn top(&self) -> i64 {
        self.y + self.height
    }
}

/// Stack directly above `idx`, if one abuts it.
pub fn stack_above(stacks: &[RowStack], idx: usize) -> Option<&RowStack> {
    let cur = &stacks[idx];
    stacks.get(idx + 1).filter(|s| s.y == cur.top())
}

/// Stack directly below `idx`, if one abuts it.
pub fn stack_below(stacks: &[RowStack], idx: usize) -> Option<&RowStack> {
    let cur = &stacks[idx];
    idx.checked_sub(1)
        .map(|i| &stacks[i])
        .filter(|s| s.top() == cur.y)
}

/// Builds the stack/sub-row view of the database rows with every blockage X-range
/// removed. Pieces are snapped onto the site grid and dropped when narrower than a site.
pub fn organize_rows(db: &LayoutDB, blockages: &[Rect]) -> Vec<RowStack> {
    let mut stacks: BTreeMap<i64, RowStack> = BTreeMap::new();

    for row in &db.rows {
        let bbox = row.bbox();
        let blocked: Vec<Span> = blockages
            .iter()
            .filter(|b| b.overlaps_y(&bbox))
            .map(|b| (b.min.x, b.max.x))
            .collect();

        let stack = stacks.entry(bbox.min.y).or_insert_with(|| RowStack {
            y: bbox.min.y,
            height: bbox.height(),
            orient: row.orient,
            subrows: Vec::new(),
        });
        if stack.orient != row.orient {
            log::warn!(
                "Row {} at y={} is {} but its neighbors are {}",
                row.name,
                bbox.min.y,
                row.orient,
                stack.orient
            );
        }

        for (lo, hi) in interval::subtract((bbox.min.x, bbox.max.x), &blocked) {
            let lo = interval::snap_up(lo, row.origin.x, row.site_width);
            let hi = interval::snap_down(hi, row.origin.x, row.site_width);
            if hi - lo < row.site_width {
                continue;
            }
            stack.subrows.push(SubRow {
                x_min: lo,
                x_max: hi,
                y: bbox.min.y,
                height: bbox.height(),
                site_width: row.site_width,
                grid_origin: row.origin.x,
                orient: row.orient,
            });
        }
    }

    stacks
        .into_values()
        .filter_map(|mut stack| {
            stack.subrows.sort_by_key(|s| s.x_min);
            let mut kept: Vec<SubRow> = Vec::with_capacity(stack.subrows.len());
            for sub in stack.subrows {
                if kept.last().is_some_and(|prev| sub.x_min < prev.x_max) {
                    log::warn!(
                        "Overlapping rows at y={} near x={}; keeping the first",
                        sub.y,
                        sub.x_min
                    );
                    continue;
                }
                kept.push(sub);
            }
            stack.subrows = kept;
            (!stack.subrows.is_empty()).then_some(stack)
        })
        .collect()
}

pub fn min_max_x(stacks: &[RowStack]) -> Option<(i64, i64)> {
    let subrows = stacks.iter().flat_map(|s| s.subrows.iter());
    let min = subrows.clone().map(|s| s.x_min).min()?;
    let max = subrows.map(|s| s.x_max).max()?;
    Some((min, max))
}
