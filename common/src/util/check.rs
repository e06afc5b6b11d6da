use crate::db::core::LayoutDB;
use crate::geom::rect::Rect;
use crate::geom::rtree::SpatialIndex;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Verifies the row-height cells of a layout: no two overlap, none intrudes into a
/// macro, and every orientation is one the master's symmetry allows.
pub fn run_filler_check(db: &LayoutDB) -> Result<(), String> {
    log::info!("Starting Filler Verification...");
    let Some(row_height) = db.row_height() else {
        log::info!("No rows; nothing to verify.");
        return Ok(());
    };
    let valid = AtomicBool::new(true);

    let mut macros = Vec::new();
    let mut per_row: BTreeMap<i64, Vec<(Rect, &str)>> = BTreeMap::new();
    for (_, inst) in db.insts() {
        let bbox = db.placed_bbox(inst);
        if bbox.height() > row_height {
            macros.push(bbox);
        } else {
            per_row
                .entry(bbox.min.y)
                .or_default()
                .push((bbox, inst.name.as_str()));
        }
    }
    let macro_index = SpatialIndex::bulk_load(&macros);

    db.insts().par_bridge().for_each(|(_, inst)| {
        let master = db.master(inst.master);
        if !master.symmetry.admits(inst.orient) {
            log::error!(
                "FAIL: '{}' placed {} but master {} does not allow it.",
                inst.name,
                inst.orient,
                master.name
            );
            valid.store(false, Ordering::Relaxed);
        }
    });

    let rows: Vec<_> = per_row.into_iter().collect();
    rows.par_iter().for_each(|(y, cells)| {
        let mut cells = cells.clone();
        cells.sort_by_key(|(r, _)| (r.min.x, r.max.x));

        for pair in cells.windows(2) {
            let (a, a_name) = pair[0];
            let (b, b_name) = pair[1];
            if b.min.x < a.max.x {
                log::error!("FAIL: Cell Overlap '{}' and '{}' at y={}", a_name, b_name, y);
                valid.store(false, Ordering::Relaxed);
            }
        }
        for (r, name) in &cells {
            if !macro_index.query(*r).is_empty() {
                log::error!("FAIL: Cell '{}' overlaps a macro.", name);
                valid.store(false, Ordering::Relaxed);
            }
        }
    });

    if valid.load(Ordering::Relaxed) {
        log::info!("\x1b[32mPASS\x1b[0m: Filler placement is valid.");
        Ok(())
    } else {
        Err("Filler verification failed.".to_string())
    }
}
