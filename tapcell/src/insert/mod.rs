pub mod boundary;
pub mod endcap;
pub mod tapcell;

use crate::fills::{FilledSite, RowFills};
use tap_common::db::core::{LayoutDB, Orient};
use tap_common::db::indices::MasterId;
use tap_common::geom::point::Point;

/// Which name prefix an inserted cell gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Tap,
    Edge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub master: MasterId,
    pub origin: Point<i64>,
    pub orient: Orient,
    pub kind: CellKind,
}

pub struct Planner<'a> {
    db: &'a LayoutDB,
    fills: RowFills,
    placements: Vec<Placement>,
}

impl<'a> Planner<'a> {
    pub fn new(db: &'a LayoutDB, fills: &RowFills) -> Self {
        Self {
            db,
            fills: fills.clone(),
            placements: Vec::new(),
        }
    }

    pub fn db(&self) -> &'a LayoutDB {
        self.db
    }

    pub fn fills(&self) -> &RowFills {
        &self.fills
    }

    /// Queues `master` at `(x, y)` unless its footprint is already taken.
    pub fn try_place(
        &mut self,
        master: MasterId,
        x: i64,
        y: i64,
        orient: Orient,
        kind: CellKind,
    ) -> bool {
        let width = self.db.master(master).width;
        if self.fills.is_filled(y, x, x + width) {
            return false;
        }
        self.fills.record(FilledSite {
            y_min: y,
            x_min: x,
            x_max: x + width,
        });
        self.placements.push(Placement {
            master,
            origin: Point::new(x, y),
            orient,
            kind,
        });
        true
    }

    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }
}
