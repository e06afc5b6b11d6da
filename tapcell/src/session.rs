use crate::blockage::find_blockages;
use crate::cut::{self, CutSummary};
use crate::error::Result;
use crate::fills::{FilledSite, RowFills, collect_fills};
use crate::insert::boundary::{plan_around_macros, plan_top_bottom};
use crate::insert::endcap::plan_endcaps;
use crate::insert::tapcell::plan_tapcells;
use crate::insert::{CellKind, Placement, Planner};
use crate::options::{Options, Role};
use crate::rows::{RowStack, organize_rows};
use tap_common::db::core::{LayoutDB, PlacementStatus};
use tap_common::db::indices::InstId;
use tap_common::geom::rect::Rect;
use tap_common::util::config::{default_endcap_prefix, default_tap_prefix};
use tap_common::util::profiler::ScopedTimer;

/// Instances inserted by one `run`, per step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub endcaps: usize,
    pub top_bottom: usize,
    pub around_macros: usize,
    pub tapcells: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.endcaps + self.top_bottom + self.around_macros + self.tapcells
    }
}

pub struct Tapcell<'a> {
    db: &'a mut LayoutDB,
    phy_idx: usize,
    filled_sites: RowFills,
    tap_prefix: String,
    endcap_prefix: String,
}

impl<'a> Tapcell<'a> {
    pub fn init(db: &'a mut LayoutDB) -> Self {
        Self {
            db,
            phy_idx: 0,
            filled_sites: RowFills::new(),
            tap_prefix: default_tap_prefix(),
            endcap_prefix: default_endcap_prefix(),
        }
    }

    pub fn db(&self) -> &LayoutDB {
        self.db
    }

    pub fn set_tap_prefix(&mut self, prefix: impl Into<String>) {
        self.tap_prefix = prefix.into();
    }

    pub fn set_endcap_prefix(&mut self, prefix: impl Into<String>) {
        self.endcap_prefix = prefix.into();
    }

    pub fn tap_prefix(&self) -> &str {
        &self.tap_prefix
    }

    pub fn endcap_prefix(&self) -> &str {
        &self.endcap_prefix
    }

    pub fn phy_idx(&self) -> usize {
        self.phy_idx
    }

    pub fn filled_sites(&self) -> &RowFills {
        &self.filled_sites
    }

    pub fn clear(&mut self) {
        self.filled_sites.clear();
        self.phy_idx = 0;
    }

    pub fn reset(&mut self) {
        self.clear();
        self.tap_prefix = default_tap_prefix();
        self.endcap_prefix = default_endcap_prefix();
    }

    /// Inserts endcaps, boundary ties and tap cells. A step whose masters are
    /// missing or cannot take the row orientation inserts nothing and ends the run
    /// with its error; cells from earlier steps stay in place.
    pub fn run(&mut self, options: &Options) -> Result<RunSummary> {
        let _timer = ScopedTimer::new("tapcell");
        let mut summary = RunSummary::default();

        self.find_row_fills(options);

        if options.endcap_master.is_some() {
            summary.endcaps = self.insert_endcaps(options)?;
        }
        if options.add_boundary_cells() {
            summary.top_bottom = self.insert_at_top_bottom(options)?;
            summary.around_macros = self.insert_around_macros(options)?;
        }
        if options.tapcell_master.is_some() {
            summary.tapcells = self.insert_tapcells(options)?;
        }

        log::info!("Inserted {} cells in total", summary.total());
        Ok(summary)
    }

    pub fn insert_endcaps(&mut self, options: &Options) -> Result<usize> {
        let stacks = self.stacks(options);
        let count = self.insert_step("endcap", |planner| plan_endcaps(planner, &stacks, options))?;
        log::info!("Endcaps inserted: {}", count);
        Ok(count)
    }

    pub fn insert_at_top_bottom(&mut self, options: &Options) -> Result<usize> {
        let stacks = self.stacks(options);
        let count = self.insert_step("top/bottom boundary", |planner| {
            plan_top_bottom(planner, &stacks, options)
        })?;
        log::info!("Top/bottom cells inserted: {}", count);
        Ok(count)
    }

    pub fn insert_around_macros(&mut self, options: &Options) -> Result<usize> {
        let stacks = self.stacks(options);
        let count = self.insert_step("macro boundary", |planner| {
            plan_around_macros(planner, &stacks, options)
        })?;
        log::info!("Cells inserted near blockages: {}", count);
        Ok(count)
    }

    pub fn insert_tapcells(&mut self, options: &Options) -> Result<usize> {
        let tap = options.require(Role::Tapcell)?;
        let dist = options.dist_or_default(self.db);
        let stacks = self.stacks(options);
        let count = self.insert_step("tapcell", |planner| {
            plan_tapcells(planner, &stacks, tap, dist)
        })?;
        log::info!("Tapcells inserted: {}", count);
        Ok(count)
    }

    /// Splits rows around macros, keeping the halo clear. Rows cut shorter than two
    /// endcaps are removed.
    pub fn cut_rows(&mut self, options: &Options) -> CutSummary {
        let _timer = ScopedTimer::new("cut rows");
        let blockages = find_blockages(self.db);
        let halo_x = options.halo_x_or_default(self.db);
        let halo_y = options.halo_y_or_default(self.db);
        let min_width = options
            .endcap_master
            .map(|m| 2 * self.db.master(m).width)
            .unwrap_or(0);
        cut::cut_rows(self.db, &blockages, halo_x, halo_y, min_width)
    }

    /// Deletes every instance whose name starts with `prefix` and returns how many
    /// went. Occupancy is dropped and rebuilt by the next `run` or `find_row_fills`.
    pub fn remove_cells(&mut self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }
        let doomed: Vec<InstId> = self
            .db
            .insts()
            .filter(|(_, inst)| inst.name.starts_with(prefix))
            .map(|(id, _)| id)
            .collect();

        let mut removed = 0;
        for id in doomed {
            match self.db.destroy_inst(id) {
                Ok(_) => removed += 1,
                Err(e) => log::warn!("Failed to remove instance: {}", e),
            }
        }
        self.filled_sites.clear();
        log::info!("Removed {} cells with prefix '{}'", removed, prefix);
        removed
    }

    /// Rebuilds the occupancy map from the live instances of every configured master.
    pub fn find_row_fills(&mut self, options: &Options) -> &RowFills {
        self.filled_sites = collect_fills(self.db, &options.filler_masters());
        log::debug!(
            "Occupancy rebuilt over {} row(s)",
            self.filled_sites.rows().count()
        );
        &self.filled_sites
    }

    /// Creates one fixed instance named `<prefix><n>` with the first free `n`.
    pub fn make_instance(&mut self, placement: &Placement) -> Result<InstId> {
        let prefix = match placement.kind {
            CellKind::Tap => &self.tap_prefix,
            CellKind::Edge => &self.endcap_prefix,
        };
        let name = loop {
            let name = format!("{}{}", prefix, self.phy_idx);
            self.phy_idx += 1;
            if !self.db.has_inst(&name) {
                break name;
            }
        };

        let id = self.db.create_inst(
            &name,
            placement.master,
            placement.origin,
            placement.orient,
            PlacementStatus::Fixed,
        )?;
        let width = self.db.master(placement.master).width;
        self.filled_sites.record(FilledSite {
            y_min: placement.origin.y,
            x_min: placement.origin.x,
            x_max: placement.origin.x + width,
        });
        Ok(id)
    }

    fn stacks(&self, options: &Options) -> Vec<RowStack> {
        let halo_x = options.halo_x_or_default(self.db);
        let halo_y = options.halo_y_or_default(self.db);
        let blockages: Vec<Rect> = find_blockages(self.db)
            .iter()
            .map(|b| b.bloat(halo_x, halo_y))
            .collect();
        organize_rows(self.db, &blockages)
    }

    fn insert_step<F>(&mut self, label: &str, plan: F) -> Result<usize>
    where
        F: FnOnce(&mut Planner) -> Result<()>,
    {
        let placements = {
            let mut planner = Planner::new(self.db, &self.filled_sites);
            if let Err(e) = plan(&mut planner) {
                log::error!("Skipping {} insertion: {}", label, e);
                return Err(e);
            }
            planner.into_placements()
        };

        let mut count = 0;
        for placement in &placements {
            if let Err(e) = self.make_instance(placement) {
                log::error!(
                    "{} insertion stopped after {} cells: {}",
                    label,
                    count,
                    e
                );
                return Err(e);
            }
            count += 1;
        }
        Ok(count)
    }
}
