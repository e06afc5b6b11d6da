use super::{CellKind, Planner};
use crate::blockage::{find_row_breaks, get_macro_outlines};
use crate::boundary::{LocationType, Polarity, polarity, require_symmetry};
use crate::error::Result;
use crate::options::{Options, TieMasters};
use crate::rows::{RowStack, SubRow, min_max_x};
use tap_common::db::core::Orient;
use tap_common::geom::interval::{self, Span};

/// Counts of `(ties, two-site, three-site)` cells that tile `len` exactly, using as
/// many full ties as possible.
pub fn decompose(len: i64, tie: i64, two: i64, three: i64) -> Option<(i64, i64, i64)> {
    if len <= 0 {
        return Some((0, 0, 0));
    }
    if tie <= 0 || two <= 0 || three <= 0 {
        return None;
    }
    for ties in (0..=len / tie).rev() {
        let rest = len - ties * tie;
        for threes in (0..=rest / three).rev() {
            let left = rest - threes * three;
            if left % two == 0 {
                return Some((ties, left / two, threes));
            }
        }
    }
    None
}

/// Fills the unoccupied part of `span` inside `sub` with ties of one polarity.
/// Three-site cells go first, then two-site, then full ties.
fn plan_band(planner: &mut Planner, sub: &SubRow, span: Span, ties: &TieMasters, orient: Orient) {
    let Some(clipped) = sub.clip(span) else {
        return;
    };
    let db = planner.db();
    let tie_w = db.master(ties.tie).width;
    let two_w = db.master(ties.two).width;
    let three_w = db.master(ties.three).width;

    let free = interval::subtract(clipped, planner.fills().row(sub.y));
    for (lo, hi) in free {
        let Some((lo, hi)) = sub.clip((lo, hi)) else {
            continue;
        };
        let len = hi - lo;
        let mut cells = Vec::new();
        match decompose(len, tie_w, two_w, three_w) {
            Some((n_tie, n_two, n_three)) => {
                cells.extend(std::iter::repeat_n(ties.three, n_three as usize));
                cells.extend(std::iter::repeat_n(ties.two, n_two as usize));
                cells.extend(std::iter::repeat_n(ties.tie, n_tie as usize));
            }
            None => {
                let n_tie = if tie_w > 0 { len / tie_w } else { 0 };
                log::warn!(
                    "Cannot tile {} DBU at ({}, {}) exactly; {} DBU left open",
                    len,
                    lo,
                    sub.y,
                    len - n_tie * tie_w
                );
                cells.extend(std::iter::repeat_n(ties.tie, n_tie as usize));
            }
        }

        let mut x = lo;
        for master in cells {
            planner.try_place(master, x, sub.y, orient, CellKind::Edge);
            x += db.master(master).width;
        }
    }
}

fn require_ties(
    planner: &Planner,
    polarity: Polarity,
    options: &Options,
    orient: Orient,
) -> Result<TieMasters> {
    let ties = options.tie_masters(polarity)?;
    let [tie, two, three] = Options::tie_roles(polarity);
    let db = planner.db();
    require_symmetry(db, tie, ties.tie, orient)?;
    require_symmetry(db, two, ties.two, orient)?;
    require_symmetry(db, three, ties.three, orient)?;
    Ok(ties)
}

/// Closes the wells along the bottom edge of the lowest stack and the top edge of
/// the highest one.
pub fn plan_top_bottom(planner: &mut Planner, stacks: &[RowStack], options: &Options) -> Result<()> {
    let Some(last) = stacks.len().checked_sub(1) else {
        return Ok(());
    };
    let mut edges = vec![(0, LocationType::AboveMacro)];
    if last > 0 {
        edges.push((last, LocationType::BelowMacro));
    }

    for (idx, location) in edges {
        for sub in &stacks[idx].subrows {
            let Some(polarity) = polarity(location, sub.orient) else {
                continue;
            };
            let ties = require_ties(planner, polarity, options, sub.orient)?;
            plan_band(planner, sub, sub.span(), &ties, sub.orient);
        }
    }
    Ok(())
}

/// Closes the wells of the rows directly above and below every macro outline, with
/// an inner corner cap on each side of the band where the row continues.
pub fn plan_around_macros(
    planner: &mut Planner,
    stacks: &[RowStack],
    options: &Options,
) -> Result<()> {
    let outlines = get_macro_outlines(stacks);

    for (&span, runs) in &outlines {
        for run in runs {
            let top = &stacks[run.top];
            if let Some(edge) = stacks.get(run.top + 1).filter(|s| s.y == top.top()) {
                plan_macro_edge(planner, edge, span, LocationType::AboveMacro, options)?;
            }
            let bottom = &stacks[run.bottom];
            if let Some(edge) = run
                .bottom
                .checked_sub(1)
                .map(|i| &stacks[i])
                .filter(|s| s.top() == bottom.y)
            {
                plan_macro_edge(planner, edge, span, LocationType::BelowMacro, options)?;
            }
        }
    }

    // Macros spanning the whole core leave no gap inside any stack, only a break
    // between two stacks.
    let Some(core) = min_max_x(stacks) else {
        return Ok(());
    };
    for idx in find_row_breaks(stacks) {
        plan_macro_edge(planner, &stacks[idx], core, LocationType::BelowMacro, options)?;
        plan_macro_edge(planner, &stacks[idx + 1], core, LocationType::AboveMacro, options)?;
    }
    Ok(())
}

fn plan_macro_edge(
    planner: &mut Planner,
    edge: &RowStack,
    span: Span,
    location: LocationType,
    options: &Options,
) -> Result<()> {
    let (x0, x1) = span;
    for sub in edge.subrows.iter().filter(|s| s.x_max > x0 && s.x_min < x1) {
        let Some(polarity) = polarity(location, sub.orient) else {
            continue;
        };
        let ties = require_ties(planner, polarity, options, sub.orient)?;

        let corner_role = Options::inner_corner_role(polarity);
        let corner = options.require(corner_role)?;
        let db = planner.db();
        let width = db.master(corner).width;

        if sub.x_min <= x0 - width && x0 <= sub.x_max {
            require_symmetry(db, corner_role, corner, sub.orient)?;
            planner.try_place(corner, x0 - width, sub.y, sub.orient, CellKind::Edge);
        }
        if sub.x_min <= x1 && x1 + width <= sub.x_max {
            let flipped = sub.orient.flip_y();
            require_symmetry(db, corner_role, corner, flipped)?;
            planner.try_place(corner, x1, sub.y, flipped, CellKind::Edge);
        }

        plan_band(planner, sub, span, &ties, sub.orient);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_prefers_full_ties() {
        assert_eq!(decompose(100, 20, 20, 30), Some((5, 0, 0)));
        assert_eq!(decompose(110, 20, 20, 30), Some((4, 0, 1)));
        assert_eq!(decompose(50, 40, 20, 30), Some((0, 1, 1)));
        assert_eq!(decompose(0, 40, 20, 30), Some((0, 0, 0)));
    }

    #[test]
    fn decompose_reports_untileable_lengths() {
        assert_eq!(decompose(10, 40, 20, 30), None);
        assert_eq!(decompose(35, 40, 20, 30), None);
        assert_eq!(decompose(100, 0, 20, 30), None);
    }
}
