use super::{CellKind, Planner};
use crate::boundary::require_symmetry;
use crate::error::Result;
use crate::options::Role;
use crate::rows::{RowStack, SubRow};
use tap_common::db::indices::MasterId;
use tap_common::geom::interval;

/// Distance between tap candidates in a sub-row: `dist` rounded down to whole
/// sites, but never less than one site or the tap's own width.
pub fn tap_step(sub: &SubRow, tap_width: i64, dist: i64) -> i64 {
    let site = sub.site_width;
    let snapped = (dist / site) * site;
    let min_step = interval::snap_up(tap_width, 0, site);
    snapped.max(site).max(min_step)
}

/// Queues tap cells left to right through every sub-row. The first candidate is one
/// site in from the sub-row start, the rest follow at `tap_step`, and candidates
/// that land on an occupied range are skipped because that filler already covers
/// the spot. Any slack from rounding ends up in the last gap of the sub-row.
pub fn plan_tapcells(
    planner: &mut Planner,
    stacks: &[RowStack],
    tap_master: MasterId,
    dist: i64,
) -> Result<()> {
    let db = planner.db();
    let tap_width = db.master(tap_master).width;

    for stack in stacks {
        for sub in &stack.subrows {
            require_symmetry(db, Role::Tapcell, tap_master, sub.orient)?;

            let step = tap_step(sub, tap_width, dist);
            let mut x = sub.x_min + sub.site_width;
            while x + tap_width <= sub.x_max {
                planner.try_place(tap_master, x, sub.y, sub.orient, CellKind::Tap);
                x += step;
            }
        }
    }
    Ok(())
}
