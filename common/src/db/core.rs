use crate::db::error::DbError;
use crate::db::indices::*;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orient {
    #[default]
    R0,
    R90,
    R180,
    R270,
    MY,
    MYR90,
    MX,
    MXR90,
}

impl Orient {
    pub fn def_name(&self) -> &'static str {
        match self {
            Orient::R0 => "N",
            Orient::R90 => "W",
            Orient::R180 => "S",
            Orient::R270 => "E",
            Orient::MY => "FN",
            Orient::MYR90 => "FE",
            Orient::MX => "FS",
            Orient::MXR90 => "FW",
        }
    }

    pub fn from_def_name(name: &str) -> Option<Self> {
        let orient = match name {
            "N" | "R0" => Orient::R0,
            "W" | "R90" => Orient::R90,
            "S" | "R180" => Orient::R180,
            "E" | "R270" => Orient::R270,
            "FN" | "MY" => Orient::MY,
            "FE" | "MYR90" => Orient::MYR90,
            "FS" | "MX" => Orient::MX,
            "FW" | "MXR90" => Orient::MXR90,
            _ => return None,
        };
        Some(orient)
    }

    /// Mirror about a vertical axis, as used for the right-hand cap of a row.
    pub fn flip_y(self) -> Self {
        match self {
            Orient::R0 => Orient::MY,
            Orient::MY => Orient::R0,
            Orient::MX => Orient::R180,
            Orient::R180 => Orient::MX,
            Orient::R90 => Orient::MXR90,
            Orient::MXR90 => Orient::R90,
            Orient::R270 => Orient::MYR90,
            Orient::MYR90 => Orient::R270,
        }
    }

    /// True for orientations whose cell is upside down (VDD rail at the bottom).
    pub fn is_flipped_vertically(self) -> bool {
        matches!(self, Orient::MX | Orient::R180)
    }

    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Orient::R90 | Orient::R270 | Orient::MYR90 | Orient::MXR90
        )
    }
}

impl fmt::Display for Orient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orient::R0 => "R0",
            Orient::R90 => "R90",
            Orient::R180 => "R180",
            Orient::R270 => "R270",
            Orient::MY => "MY",
            Orient::MYR90 => "MYR90",
            Orient::MX => "MX",
            Orient::MXR90 => "MXR90",
        };
        f.write_str(name)
    }
}

/// LEF `SYMMETRY` flags of a master.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Symmetry {
    pub x: bool,
    pub y: bool,
    pub r90: bool,
}

impl Symmetry {
    pub const NONE: Symmetry = Symmetry {
        x: false,
        y: false,
        r90: false,
    };
    pub const XY: Symmetry = Symmetry {
        x: true,
        y: true,
        r90: false,
    };

    /// Whether a master with these flags may be placed in `orient`.
    pub fn admits(&self, orient: Orient) -> bool {
        match orient {
            Orient::R0 => true,
            Orient::MX => self.x,
            Orient::MY => self.y,
            Orient::R180 => self.x && self.y,
            Orient::R90 => self.r90,
            Orient::MXR90 => self.r90 && self.x,
            Orient::MYR90 => self.r90 && self.y,
            Orient::R270 => self.r90 && self.x && self.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MasterClass {
    #[default]
    Core,
    CoreWelltap,
    CoreSpacer,
    EndcapPre,
    EndcapPost,
    Block,
    Pad,
    Other,
}

impl MasterClass {
    pub fn from_lef(class: &str, sub_class: Option<&str>) -> Self {
        match (class, sub_class) {
            ("CORE", Some("WELLTAP")) => MasterClass::CoreWelltap,
            ("CORE", Some("SPACER")) => MasterClass::CoreSpacer,
            ("CORE", _) => MasterClass::Core,
            ("ENDCAP", Some("POST")) => MasterClass::EndcapPost,
            ("ENDCAP", _) => MasterClass::EndcapPre,
            ("BLOCK", _) => MasterClass::Block,
            ("PAD", _) => MasterClass::Pad,
            _ => MasterClass::Other,
        }
    }

    pub fn lef_name(&self) -> &'static str {
        match self {
            MasterClass::Core => "CORE",
            MasterClass::CoreWelltap => "CORE WELLTAP",
            MasterClass::CoreSpacer => "CORE SPACER",
            MasterClass::EndcapPre => "ENDCAP PRE",
            MasterClass::EndcapPost => "ENDCAP POST",
            MasterClass::Block => "BLOCK",
            MasterClass::Pad => "PAD",
            MasterClass::Other => "COVER",
        }
    }
}

#[derive(Clone, Debug)]
pub struct MasterData {
    pub name: String,
    pub width: i64,
    pub height: i64,
    pub class: MasterClass,
    pub symmetry: Symmetry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowData {
    pub name: String,
    pub site: String,
    pub origin: Point<i64>,
    pub orient: Orient,
    pub num_sites: i64,
    pub site_width: i64,
    pub site_height: i64,
}

impl RowData {
    pub fn bbox(&self) -> Rect {
        Rect::new(
            self.origin,
            Point::new(
                self.origin.x + self.num_sites * self.site_width,
                self.origin.y + self.site_height,
            ),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementStatus {
    Unplaced,
    #[default]
    Placed,
    Fixed,
}

impl PlacementStatus {
    pub fn def_name(&self) -> &'static str {
        match self {
            PlacementStatus::Unplaced => "UNPLACED",
            PlacementStatus::Placed => "PLACED",
            PlacementStatus::Fixed => "FIXED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstData {
    pub name: String,
    pub master: MasterId,
    pub origin: Point<i64>,
    pub orient: Orient,
    pub status: PlacementStatus,
}

/// In-memory chip database: sites, masters, rows and placed instances.
///
/// Instances live in an arena of `Option` slots. Deleting an instance empties its
/// slot, so an `InstId` kept past a deletion resolves to nothing rather than to a
/// different instance.
pub struct LayoutDB {
    pub design: String,
    pub dbu_per_micron: i64,
    pub die_area: Rect,
    pub sites: HashMap<String, (i64, i64)>,
    pub masters: Vec<MasterData>,
    pub master_name_map: HashMap<String, MasterId>,
    pub rows: Vec<RowData>,

    insts: Vec<Option<InstData>>,
    inst_name_map: HashMap<String, InstId>,
}

impl LayoutDB {
    pub fn new() -> Self {
        Self {
            design: "top".to_string(),
            dbu_per_micron: 1000,
            die_area: Rect::default(),
            sites: HashMap::new(),
            masters: Vec::new(),
            master_name_map: HashMap::new(),
            rows: Vec::new(),
            insts: Vec::with_capacity(1000),
            inst_name_map: HashMap::new(),
        }
    }

    pub fn num_masters(&self) -> usize {
        self.masters.len()
    }
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
    pub fn num_insts(&self) -> usize {
        self.inst_name_map.len()
    }

    pub fn microns_to_dbu(&self, microns: f64) -> i64 {
        (microns * self.dbu_per_micron as f64).round() as i64
    }

    /// Switches to a new database unit, rescaling every library footprint read so far.
    pub fn set_dbu_per_micron(&mut self, dbu_per_micron: i64) {
        if dbu_per_micron == self.dbu_per_micron || dbu_per_micron <= 0 {
            return;
        }
        let old = self.dbu_per_micron;
        let scale = move |v: i64| v * dbu_per_micron / old;
        for master in &mut self.masters {
            master.width = scale(master.width);
            master.height = scale(master.height);
        }
        for size in self.sites.values_mut() {
            *size = (scale(size.0), scale(size.1));
        }
        self.dbu_per_micron = dbu_per_micron;
    }

    /// Adds a master, or replaces the footprint of an existing one with the same name.
    pub fn add_master(
        &mut self,
        name: &str,
        width: i64,
        height: i64,
        class: MasterClass,
        symmetry: Symmetry,
    ) -> MasterId {
        let data = MasterData {
            name: name.to_string(),
            width,
            height,
            class,
            symmetry,
        };
        if let Some(&id) = self.master_name_map.get(name) {
            self.masters[id.index()] = data;
            return id;
        }
        let id = MasterId::new(self.masters.len());
        self.masters.push(data);
        self.master_name_map.insert(name.to_string(), id);
        id
    }

    pub fn find_master(&self, name: &str) -> Option<MasterId> {
        self.master_name_map.get(name).copied()
    }

    #[inline]
    pub fn master(&self, id: MasterId) -> &MasterData {
        &self.masters[id.index()]
    }

    pub fn add_row(&mut self, row: RowData) -> RowId {
        let id = RowId::new(self.rows.len());
        self.rows.push(row);
        id
    }

    /// Replaces the row set wholesale. Row ids handed out earlier become meaningless.
    pub fn replace_rows(&mut self, rows: Vec<RowData>) {
        self.rows = rows;
    }

    /// Smallest site height over all rows; instances taller than this are macros.
    pub fn row_height(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.site_height).min()
    }

    /// Bounding box of all rows.
    pub fn core_area(&self) -> Option<Rect> {
        let mut boxes = self.rows.iter().map(RowData::bbox);
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| {
            Rect::new(
                Point::new(acc.min.x.min(b.min.x), acc.min.y.min(b.min.y)),
                Point::new(acc.max.x.max(b.max.x), acc.max.y.max(b.max.y)),
            )
        }))
    }

    pub fn create_inst(
        &mut self,
        name: &str,
        master: MasterId,
        origin: Point<i64>,
        orient: Orient,
        status: PlacementStatus,
    ) -> Result<InstId, DbError> {
        if master.index() >= self.masters.len() {
            return Err(DbError::UnknownMaster(master));
        }
        if self.inst_name_map.contains_key(name) {
            return Err(DbError::DuplicateInstance(name.to_string()));
        }
        let id = InstId::new(self.insts.len());
        self.insts.push(Some(InstData {
            name: name.to_string(),
            master,
            origin,
            orient,
            status,
        }));
        self.inst_name_map.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn destroy_inst(&mut self, id: InstId) -> Result<InstData, DbError> {
        let data = self
            .insts
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(DbError::StaleInstance(id))?;
        self.inst_name_map.remove(&data.name);
        Ok(data)
    }

    pub fn inst(&self, id: InstId) -> Option<&InstData> {
        self.insts.get(id.index()).and_then(Option::as_ref)
    }

    pub fn find_inst(&self, name: &str) -> Option<InstId> {
        self.inst_name_map.get(name).copied()
    }

    pub fn has_inst(&self, name: &str) -> bool {
        self.inst_name_map.contains_key(name)
    }

    /// Live instances in creation order.
    pub fn insts(&self) -> impl Iterator<Item = (InstId, &InstData)> + '_ {
        self.insts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|inst| (InstId::new(i), inst)))
    }

    pub fn placed_bbox(&self, inst: &InstData) -> Rect {
        let master = self.master(inst.master);
        let (w, h) = if inst.orient.is_rotated() {
            (master.height, master.width)
        } else {
            (master.width, master.height)
        };
        Rect::new(
            inst.origin,
            Point::new(inst.origin.x + w, inst.origin.y + h),
        )
    }
}

impl Default for LayoutDB {
    fn default() -> Self {
        Self::new()
    }
}
