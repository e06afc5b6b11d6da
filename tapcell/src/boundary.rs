use crate::error::{Result, TapcellError};
use crate::options::{Options, Role};
use crate::rows::RowStack;
use tap_common::db::core::{LayoutDB, MasterData, Orient};
use tap_common::db::indices::MasterId;

/// Where a stretch of row sits relative to the empty region next to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationType {
    /// Rows continue above but not below: a macro or the core edge is underneath.
    AboveMacro,
    /// Rows continue below but not above: a macro or the core edge is on top.
    BelowMacro,
    /// Rows on both sides, or on neither.
    NoMacro,
}

/// Which well the boundary cell has to close off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    NwIn,
    NwOut,
}

/// `(location, row upside down) -> polarity`. An upright row has its N-well along
/// the top edge, so an empty region above it needs the N-well-in variant.
const POLARITY_TABLE: [(LocationType, bool, Polarity); 4] = [
    (LocationType::AboveMacro, false, Polarity::NwOut),
    (LocationType::AboveMacro, true, Polarity::NwIn),
    (LocationType::BelowMacro, false, Polarity::NwIn),
    (LocationType::BelowMacro, true, Polarity::NwOut),
];

pub fn get_location_type(
    x_min: i64,
    x_max: i64,
    rows_above: Option<&RowStack>,
    rows_below: Option<&RowStack>,
) -> LocationType {
    let in_above = rows_above.is_some_and(|s| s.covers(x_min, x_max));
    let in_below = rows_below.is_some_and(|s| s.covers(x_min, x_max));
    match (in_above, in_below) {
        (true, false) => LocationType::AboveMacro,
        (false, true) => LocationType::BelowMacro,
        _ => LocationType::NoMacro,
    }
}

pub fn polarity(location: LocationType, orient: Orient) -> Option<Polarity> {
    let flipped = orient.is_flipped_vertically();
    POLARITY_TABLE
        .iter()
        .find(|(loc, f, _)| *loc == location && *f == flipped)
        .map(|&(_, _, p)| p)
}

pub fn check_symmetry(master: &MasterData, orient: Orient) -> bool {
    master.symmetry.admits(orient)
}

/// Returns `master` if it may be placed in `orient`, else a configuration error.
pub fn require_symmetry(
    db: &LayoutDB,
    role: Role,
    master: MasterId,
    orient: Orient,
) -> Result<MasterId> {
    let data = db.master(master);
    if check_symmetry(data, orient) {
        Ok(master)
    } else {
        Err(TapcellError::Symmetry {
            role,
            master: data.name.clone(),
            orient,
        })
    }
}

/// Picks the cap for one end of a sub-row: the corner cap for the location's
/// polarity if configured and placeable in `orient`, otherwise the plain endcap.
pub fn pick_corner_master(
    db: &LayoutDB,
    options: &Options,
    location: LocationType,
    orient: Orient,
) -> Result<(Role, MasterId)> {
    let corner = polarity(location, orient).map(Options::corner_role);
    let candidates = corner.into_iter().chain([Role::Endcap]);

    let mut rejected = None;
    for role in candidates {
        let Some(master) = options.master(role) else {
            continue;
        };
        if check_symmetry(db.master(master), orient) {
            return Ok((role, master));
        }
        log::debug!(
            "{} ({}) cannot be placed {}",
            db.master(master).name,
            role,
            orient
        );
        rejected.get_or_insert((role, master));
    }

    match options.endcap_master {
        Some(endcap) => Err(TapcellError::Symmetry {
            role: Role::Endcap,
            master: db.master(endcap).name.clone(),
            orient,
        }),
        None => match rejected {
            Some((role, master)) => Err(TapcellError::Symmetry {
                role,
                master: db.master(master).name.clone(),
                orient,
            }),
            None => Err(TapcellError::MissingMaster(Role::Endcap)),
        },
    }
}
