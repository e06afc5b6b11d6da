use crate::rows::{RowStack, min_max_x};
use std::collections::BTreeMap;
use tap_common::db::core::LayoutDB;
use tap_common::geom::interval::Span;
use tap_common::geom::rect::Rect;

/// Bounding boxes of every instance taller than a row, without duplicates.
pub fn find_blockages(db: &LayoutDB) -> Vec<Rect> {
    let Some(row_height) = db.row_height() else {
        return Vec::new();
    };

    let mut blockages: Vec<Rect> = db
        .insts()
        .map(|(_, inst)| db.placed_bbox(inst))
        .filter(|bbox| bbox.height() > row_height)
        .collect();
    blockages.sort_by_key(|r| (r.min.x, r.min.y, r.max.x, r.max.y));
    blockages.dedup();

    log::debug!("Found {} macro blockages", blockages.len());
    blockages
}

/// A run of consecutive row stacks that all have the same gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutlineRun {
    /// Index of the lowest stack with the gap.
    pub bottom: usize,
    /// Index of the highest stack with the gap.
    pub top: usize,
}

pub type MacroOutlines = BTreeMap<Span, Vec<OutlineRun>>;

/// Maps every gap `(x_min, x_max)` in the rows to the vertical runs of stacks that
/// have exactly that gap. A gap is any stretch between the outermost row extents
/// that a stack does not cover, so macros touching the core edge are included.
///
/// The stacks just below `bottom` and just above `top` of each run are the rows
/// bordering the macro.
pub fn get_macro_outlines(stacks: &[RowStack]) -> MacroOutlines {
    let mut outlines = MacroOutlines::new();
    let Some((core_min, core_max)) = min_max_x(stacks) else {
        return outlines;
    };

    let mut gaps: BTreeMap<Span, Vec<usize>> = BTreeMap::new();
    for (idx, stack) in stacks.iter().enumerate() {
        let mut x = core_min;
        for sub in &stack.subrows {
            if sub.x_min > x {
                gaps.entry((x, sub.x_min)).or_default().push(idx);
            }
            x = x.max(sub.x_max);
        }
        if x < core_max {
            gaps.entry((x, core_max)).or_default().push(idx);
        }
    }

    for (span, rows) in gaps {
        let mut runs = Vec::new();
        let mut start = rows[0];
        let mut prev = rows[0];
        for &idx in &rows[1..] {
            if idx != prev + 1 || stacks[prev].top() != stacks[idx].y {
                runs.push(OutlineRun {
                    bottom: start,
                    top: prev,
                });
                start = idx;
            }
            prev = idx;
        }
        runs.push(OutlineRun {
            bottom: start,
            top: prev,
        });
        outlines.insert(span, runs);
    }
    outlines
}

/// Indices `i` where stack `i + 1` does not abut stack `i`. Every row between them
/// was blocked over the full core width, so stack `i` sits under a void and stack
/// `i + 1` on top of one.
pub fn find_row_breaks(stacks: &[RowStack]) -> Vec<usize> {
    stacks
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].top() != pair[1].y)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::organize_rows;
    use tap_common::db::core::{MasterClass, Orient, PlacementStatus, RowData, Symmetry};
    use tap_common::geom::point::Point;

    fn db_with_rows(n: usize) -> LayoutDB {
        let mut db = LayoutDB::new();
        for i in 0..n {
            db.add_row(RowData {
                name: format!("ROW_{}", i),
                site: "core".to_string(),
                origin: Point::new(0, i as i64 * 100),
                orient: Orient::R0,
                num_sites: 100,
                site_width: 10,
                site_height: 100,
            });
        }
        db
    }

    #[test]
    fn only_tall_instances_block() {
        let mut db = db_with_rows(4);
        let ram = db.add_master("RAM", 200, 200, MasterClass::Block, Symmetry::NONE);
        let tap = db.add_master("TAP", 10, 100, MasterClass::CoreWelltap, Symmetry::XY);
        db.create_inst("ram", ram, Point::new(300, 100), Orient::R0, PlacementStatus::Fixed)
            .unwrap();
        db.create_inst("tap", tap, Point::new(0, 0), Orient::R0, PlacementStatus::Placed)
            .unwrap();

        assert_eq!(find_blockages(&db), vec![Rect::from_coords(300, 100, 500, 300)]);
    }

    #[test]
    fn outlines_group_consecutive_rows() {
        let db = db_with_rows(6);
        let blockages = [
            Rect::from_coords(300, 100, 500, 300),
            Rect::from_coords(300, 400, 500, 500),
            Rect::from_coords(0, 0, 100, 100),
        ];
        let stacks = organize_rows(&db, &blockages);
        let outlines = get_macro_outlines(&stacks);

        assert_eq!(
            outlines.get(&(300, 500)),
            Some(&vec![
                OutlineRun { bottom: 1, top: 2 },
                OutlineRun { bottom: 4, top: 4 },
            ])
        );
        assert_eq!(
            outlines.get(&(0, 100)),
            Some(&vec![OutlineRun { bottom: 0, top: 0 }])
        );
        assert_eq!(outlines.len(), 2);
        assert!(find_row_breaks(&stacks).is_empty());
    }

    #[test]
    fn full_width_blockage_breaks_the_stacks() {
        let db = db_with_rows(6);
        let blockages = [Rect::from_coords(0, 200, 1000, 400)];
        let stacks = organize_rows(&db, &blockages);

        assert_eq!(stacks.len(), 4);
        assert_eq!(find_row_breaks(&stacks), vec![1]);
        assert!(get_macro_outlines(&stacks).is_empty());
    }
}
