use crate::boundary::Polarity;
use crate::error::{Result, TapcellError};
use std::fmt;
use tap_common::db::core::LayoutDB;
use tap_common::db::indices::MasterId;
use tap_common::util::config::TapcellConfig;

/// The job a master performs in a tapcell run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Tapcell,
    Endcap,
    CnrcapNwin,
    CnrcapNwout,
    TapNwintie,
    TapNwin2,
    TapNwin3,
    TapNwouttie,
    TapNwout2,
    TapNwout3,
    IncnrcapNwin,
    IncnrcapNwout,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Tapcell,
        Role::Endcap,
        Role::CnrcapNwin,
        Role::CnrcapNwout,
        Role::TapNwintie,
        Role::TapNwin2,
        Role::TapNwin3,
        Role::TapNwouttie,
        Role::TapNwout2,
        Role::TapNwout3,
        Role::IncnrcapNwin,
        Role::IncnrcapNwout,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Role::Tapcell => "tapcell_master",
            Role::Endcap => "endcap_master",
            Role::CnrcapNwin => "cnrcap_nwin_master",
            Role::CnrcapNwout => "cnrcap_nwout_master",
            Role::TapNwintie => "tap_nwintie_master",
            Role::TapNwin2 => "tap_nwin2_master",
            Role::TapNwin3 => "tap_nwin3_master",
            Role::TapNwouttie => "tap_nwouttie_master",
            Role::TapNwout2 => "tap_nwout2_master",
            Role::TapNwout3 => "tap_nwout3_master",
            Role::IncnrcapNwin => "incnrcap_nwin_master",
            Role::IncnrcapNwout => "incnrcap_nwout_master",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Well-tie masters of one polarity, in fill order: full tie, two-site, three-site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TieMasters {
    pub tie: MasterId,
    pub two: MasterId,
    pub three: MasterId,
}

/// Configuration for one run. Distances are in database units; `None` or a negative
/// value selects the 2 µm default.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub tapcell_master: Option<MasterId>,
    pub endcap_master: Option<MasterId>,
    pub dist: Option<i64>,
    pub halo_x: Option<i64>,
    pub halo_y: Option<i64>,
    pub cnrcap_nwin_master: Option<MasterId>,
    pub cnrcap_nwout_master: Option<MasterId>,
    pub tap_nwintie_master: Option<MasterId>,
    pub tap_nwin2_master: Option<MasterId>,
    pub tap_nwin3_master: Option<MasterId>,
    pub tap_nwouttie_master: Option<MasterId>,
    pub tap_nwout2_master: Option<MasterId>,
    pub tap_nwout3_master: Option<MasterId>,
    pub incnrcap_nwin_master: Option<MasterId>,
    pub incnrcap_nwout_master: Option<MasterId>,
}

impl Options {
    /// Resolves the master names of a config section against the library.
    pub fn from_config(config: &TapcellConfig, db: &LayoutDB) -> Result<Self> {
        let mut options = Options {
            dist: to_dbu(config.distance, db),
            halo_x: to_dbu(config.halo_width_x, db),
            halo_y: to_dbu(config.halo_width_y, db),
            ..Options::default()
        };

        let names = [
            (Role::Tapcell, &config.tapcell_master),
            (Role::Endcap, &config.endcap_master),
            (Role::CnrcapNwin, &config.cnrcap_nwin_master),
            (Role::CnrcapNwout, &config.cnrcap_nwout_master),
            (Role::TapNwintie, &config.tap_nwintie_master),
            (Role::TapNwin2, &config.tap_nwin2_master),
            (Role::TapNwin3, &config.tap_nwin3_master),
            (Role::TapNwouttie, &config.tap_nwouttie_master),
            (Role::TapNwout2, &config.tap_nwout2_master),
            (Role::TapNwout3, &config.tap_nwout3_master),
            (Role::IncnrcapNwin, &config.incnrcap_nwin_master),
            (Role::IncnrcapNwout, &config.incnrcap_nwout_master),
        ];
        for (role, name) in names {
            let Some(name) = name else { continue };
            let id = db
                .find_master(name)
                .ok_or_else(|| TapcellError::UnknownMaster {
                    role,
                    name: name.clone(),
                })?;
            *options.slot_mut(role) = Some(id);
        }
        Ok(options)
    }

    pub fn master(&self, role: Role) -> Option<MasterId> {
        match role {
            Role::Tapcell => self.tapcell_master,
            Role::Endcap => self.endcap_master,
            Role::CnrcapNwin => self.cnrcap_nwin_master,
            Role::CnrcapNwout => self.cnrcap_nwout_master,
            Role::TapNwintie => self.tap_nwintie_master,
            Role::TapNwin2 => self.tap_nwin2_master,
            Role::TapNwin3 => self.tap_nwin3_master,
            Role::TapNwouttie => self.tap_nwouttie_master,
            Role::TapNwout2 => self.tap_nwout2_master,
            Role::TapNwout3 => self.tap_nwout3_master,
            Role::IncnrcapNwin => self.incnrcap_nwin_master,
            Role::IncnrcapNwout => self.incnrcap_nwout_master,
        }
    }

    pub fn set_master(&mut self, role: Role, master: MasterId) -> &mut Self {
        *self.slot_mut(role) = Some(master);
        self
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<MasterId> {
        match role {
            Role::Tapcell => &mut self.tapcell_master,
            Role::Endcap => &mut self.endcap_master,
            Role::CnrcapNwin => &mut self.cnrcap_nwin_master,
            Role::CnrcapNwout => &mut self.cnrcap_nwout_master,
            Role::TapNwintie => &mut self.tap_nwintie_master,
            Role::TapNwin2 => &mut self.tap_nwin2_master,
            Role::TapNwin3 => &mut self.tap_nwin3_master,
            Role::TapNwouttie => &mut self.tap_nwouttie_master,
            Role::TapNwout2 => &mut self.tap_nwout2_master,
            Role::TapNwout3 => &mut self.tap_nwout3_master,
            Role::IncnrcapNwin => &mut self.incnrcap_nwin_master,
            Role::IncnrcapNwout => &mut self.incnrcap_nwout_master,
        }
    }

    pub fn require(&self, role: Role) -> Result<MasterId> {
        self.master(role).ok_or(TapcellError::MissingMaster(role))
    }

    /// Boundary ties and inner corner caps run only when all eight of their masters exist.
    pub fn add_boundary_cells(&self) -> bool {
        self.tap_nwintie_master.is_some()
            && self.tap_nwin2_master.is_some()
            && self.tap_nwin3_master.is_some()
            && self.tap_nwouttie_master.is_some()
            && self.tap_nwout2_master.is_some()
            && self.tap_nwout3_master.is_some()
            && self.incnrcap_nwin_master.is_some()
            && self.incnrcap_nwout_master.is_some()
    }

    /// Every configured master; instances of these count as occupied sites.
    pub fn filler_masters(&self) -> Vec<MasterId> {
        let mut masters: Vec<MasterId> = Role::ALL.iter().filter_map(|&r| self.master(r)).collect();
        masters.sort_unstable();
        masters.dedup();
        masters
    }

    pub fn corner_role(polarity: Polarity) -> Role {
        match polarity {
            Polarity::NwIn => Role::CnrcapNwin,
            Polarity::NwOut => Role::CnrcapNwout,
        }
    }

    pub fn inner_corner_role(polarity: Polarity) -> Role {
        match polarity {
            Polarity::NwIn => Role::IncnrcapNwin,
            Polarity::NwOut => Role::IncnrcapNwout,
        }
    }

    pub fn tie_roles(polarity: Polarity) -> [Role; 3] {
        match polarity {
            Polarity::NwIn => [Role::TapNwintie, Role::TapNwin2, Role::TapNwin3],
            Polarity::NwOut => [Role::TapNwouttie, Role::TapNwout2, Role::TapNwout3],
        }
    }

    pub fn tie_masters(&self, polarity: Polarity) -> Result<TieMasters> {
        let [tie, two, three] = Self::tie_roles(polarity);
        Ok(TieMasters {
            tie: self.require(tie)?,
            two: self.require(two)?,
            three: self.require(three)?,
        })
    }

    pub fn dist_or_default(&self, db: &LayoutDB) -> i64 {
        or_default(self.dist, db)
    }
    pub fn halo_x_or_default(&self, db: &LayoutDB) -> i64 {
        or_default(self.halo_x, db)
    }
    pub fn halo_y_or_default(&self, db: &LayoutDB) -> i64 {
        or_default(self.halo_y, db)
    }
}

/// 2 µm in database units.
pub fn default_distance(db: &LayoutDB) -> i64 {
    2 * db.dbu_per_micron
}

fn or_default(value: Option<i64>, db: &LayoutDB) -> i64 {
    value.filter(|&v| v >= 0).unwrap_or_else(|| default_distance(db))
}

fn to_dbu(microns: f64, db: &LayoutDB) -> Option<i64> {
    (microns >= 0.0).then(|| db.microns_to_dbu(microns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tap_common::db::core::{MasterClass, Symmetry};

    #[test]
    fn boundary_cells_need_all_eight_masters() {
        let mut db = LayoutDB::new();
        let m = db.add_master("X", 10, 10, MasterClass::Core, Symmetry::XY);
        let mut options = Options::default();
        for role in [
            Role::TapNwintie,
            Role::TapNwin2,
            Role::TapNwin3,
            Role::TapNwouttie,
            Role::TapNwout2,
            Role::TapNwout3,
            Role::IncnrcapNwin,
        ] {
            options.set_master(role, m);
            assert!(!options.add_boundary_cells());
        }
        options.set_master(Role::IncnrcapNwout, m);
        assert!(options.add_boundary_cells());
        assert_eq!(options.filler_masters(), vec![m]);
    }

    #[test]
    fn negative_distances_fall_back_to_two_microns() {
        let db = LayoutDB::new();
        let options = Options {
            dist: Some(-1),
            halo_x: Some(300),
            ..Options::default()
        };
        assert_eq!(options.dist_or_default(&db), 2000);
        assert_eq!(options.halo_x_or_default(&db), 300);
        assert_eq!(options.halo_y_or_default(&db), 2000);
    }

    #[test]
    fn config_names_resolve_against_library() {
        let mut db = LayoutDB::new();
        let tap = db.add_master("TAPCELL", 400, 1200, MasterClass::CoreWelltap, Symmetry::XY);
        let config = TapcellConfig {
            tapcell_master: Some("TAPCELL".to_string()),
            distance: 20.0,
            ..TapcellConfig::default()
        };
        let options = Options::from_config(&config, &db).unwrap();
        assert_eq!(options.tapcell_master, Some(tap));
        assert_eq!(options.dist, Some(20000));
        assert_eq!(options.halo_x, None);

        let bad = TapcellConfig {
            endcap_master: Some("MISSING".to_string()),
            ..TapcellConfig::default()
        };
        assert!(matches!(
            Options::from_config(&bad, &db),
            Err(TapcellError::UnknownMaster { role: Role::Endcap, .. })
        ));
    }
}
