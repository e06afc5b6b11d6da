use tap_common::db::core::{LayoutDB, RowData};
use tap_common::geom::interval::{self, Span};
use tap_common::geom::point::Point;
use tap_common::geom::rect::Rect;
use tap_common::geom::rtree::SpatialIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CutSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows that overlapped a blockage and were split or dropped.
    pub rows_cut: usize,
    /// Pieces thrown away for being narrower than the minimum width.
    pub pieces_dropped: usize,
}

/// Replaces every row that overlaps a blockage (bloated by the halo) with the
/// pieces left beside it. Pieces are snapped onto the row's site grid, named
/// `<row>_<k>`, and kept only when at least `min_row_width` wide. Rows no blockage
/// touches keep their name and position. Running it twice changes nothing.
pub fn cut_rows(
    db: &mut LayoutDB,
    blockages: &[Rect],
    halo_x: i64,
    halo_y: i64,
    min_row_width: i64,
) -> CutSummary {
    let bloated: Vec<Rect> = blockages.iter().map(|b| b.bloat(halo_x, halo_y)).collect();
    let index = SpatialIndex::bulk_load(&bloated);

    let mut summary = CutSummary {
        rows_before: db.rows.len(),
        ..CutSummary::default()
    };
    let mut rows = Vec::with_capacity(db.rows.len());

    for row in &db.rows {
        let bbox = row.bbox();
        let hits = index.query(bbox);
        if hits.is_empty() {
            rows.push(row.clone());
            continue;
        }
        summary.rows_cut += 1;

        let blocked: Vec<Span> = hits
            .iter()
            .map(|&i| (bloated[i].min.x, bloated[i].max.x))
            .collect();
        let min_width = min_row_width.max(row.site_width);
        let mut k = 0;
        for (lo, hi) in interval::subtract((bbox.min.x, bbox.max.x), &blocked) {
            let lo = interval::snap_up(lo, row.origin.x, row.site_width);
            let hi = interval::snap_down(hi, row.origin.x, row.site_width);
            if hi - lo < min_width {
                summary.pieces_dropped += 1;
                continue;
            }
            k += 1;
            rows.push(RowData {
                name: format!("{}_{}", row.name, k),
                origin: Point::new(lo, row.origin.y),
                num_sites: (hi - lo) / row.site_width,
                ..row.clone()
            });
        }
    }

    summary.rows_after = rows.len();
    db.replace_rows(rows);
    log::info!(
        "Cut {} of {} rows around {} blockages, {} rows now",
        summary.rows_cut,
        summary.rows_before,
        blockages.len(),
        summary.rows_after
    );
    summary
}
