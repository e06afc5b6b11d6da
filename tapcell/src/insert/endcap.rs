use super::{CellKind, Planner};
use crate::boundary::{get_location_type, pick_corner_master};
use crate::error::Result;
use crate::options::Options;
use crate::rows::{RowStack, stack_above, stack_below};

/// Queues a cap at both ends of every sub-row. The left cap takes the row
/// orientation and the right cap its mirror image; corner caps replace the plain
/// endcap where the rows above or below stop.
pub fn plan_endcaps(planner: &mut Planner, stacks: &[RowStack], options: &Options) -> Result<()> {
    let db = planner.db();

    for (idx, stack) in stacks.iter().enumerate() {
        let above = stack_above(stacks, idx);
        let below = stack_below(stacks, idx);

        for sub in &stack.subrows {
            let site = sub.site_width;
            let left_orient = sub.orient;
            let right_orient = sub.orient.flip_y();

            let left_loc = get_location_type(sub.x_min, sub.x_min + site, above, below);
            let right_loc = get_location_type(sub.x_max - site, sub.x_max, above, below);
            let (_, left) = pick_corner_master(db, options, left_loc, left_orient)?;
            let (_, right) = pick_corner_master(db, options, right_loc, right_orient)?;

            let left_width = db.master(left).width;
            let right_width = db.master(right).width;
            if left_width > sub.width() {
                log::debug!(
                    "Sub-row ({}, {})-({}) is narrower than an endcap; skipped",
                    sub.x_min,
                    sub.y,
                    sub.x_max
                );
                continue;
            }
            planner.try_place(left, sub.x_min, sub.y, left_orient, CellKind::Edge);

            let right_x = sub.x_max - right_width;
            if right_x < sub.x_min + left_width {
                log::warn!(
                    "Only one endcap fits in the sub-row at ({}, {}), width {}",
                    sub.x_min,
                    sub.y,
                    sub.width()
                );
                continue;
            }
            planner.try_place(right, right_x, sub.y, right_orient, CellKind::Edge);
        }
    }
    Ok(())
}
