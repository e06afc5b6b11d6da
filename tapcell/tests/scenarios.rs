use tap_common::db::core::{
    LayoutDB, MasterClass, Orient, PlacementStatus, RowData, Symmetry,
};
use tap_common::db::indices::MasterId;
use tap_common::geom::interval::{self, Span};
use tap_common::geom::point::Point;
use tap_common::util::check::run_filler_check;
use tap_common::util::config::Config;
use tap_common::util::generator::{self, FloorplanParams};
use tap_common::util::logger;
use tapcell::{Options, Role, Tapcell, TapcellError};

const SITE: i64 = 10;
const ROW_H: i64 = 100;

fn add_rows(db: &mut LayoutDB, n: usize, sites: i64) {
    for i in 0..n {
        db.add_row(RowData {
            name: format!("ROW_{}", i),
            site: "core".to_string(),
            origin: Point::new(0, i as i64 * ROW_H),
            orient: if i % 2 == 0 { Orient::R0 } else { Orient::MX },
            num_sites: sites,
            site_width: SITE,
            site_height: ROW_H,
        });
    }
}

fn filler(db: &mut LayoutDB, name: &str, sites: i64) -> MasterId {
    db.add_master(name, sites * SITE, ROW_H, MasterClass::CoreWelltap, Symmetry::XY)
}

/// Library with every role filled: tap 1 site, caps 2, ties 4/2/3, inner caps 2.
fn full_library(db: &mut LayoutDB) -> Options {
    let mut options = Options::default();
    let roles = [
        (Role::Tapcell, "TAPCELL", 1),
        (Role::Endcap, "ENDCAP", 2),
        (Role::CnrcapNwin, "CNRCAP_NWIN", 2),
        (Role::CnrcapNwout, "CNRCAP_NWOUT", 2),
        (Role::TapNwintie, "TAP_NWINTIE", 4),
        (Role::TapNwin2, "TAP_NWIN2", 2),
        (Role::TapNwin3, "TAP_NWIN3", 3),
        (Role::TapNwouttie, "TAP_NWOUTTIE", 4),
        (Role::TapNwout2, "TAP_NWOUT2", 2),
        (Role::TapNwout3, "TAP_NWOUT3", 3),
        (Role::IncnrcapNwin, "INCNRCAP_NWIN", 2),
        (Role::IncnrcapNwout, "INCNRCAP_NWOUT", 2),
    ];
    for (role, name, sites) in roles {
        let id = filler(db, name, sites);
        options.set_master(role, id);
    }
    options.dist = Some(100);
    options.halo_x = Some(0);
    options.halo_y = Some(0);
    options
}

/// Six rows of 1000 with a 200x200 macro covering rows 2 and 3 at x 400..600.
fn macro_design() -> (LayoutDB, Options) {
    let mut db = LayoutDB::new();
    add_rows(&mut db, 6, 100);
    let options = full_library(&mut db);
    let ram = db.add_master("RAM", 200, 200, MasterClass::Block, Symmetry::NONE);
    db.create_inst("ram", ram, Point::new(400, 200), Orient::R0, PlacementStatus::Fixed)
        .unwrap();
    (db, options)
}

fn names_with_prefix(db: &LayoutDB, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = db
        .insts()
        .filter(|(_, i)| i.name.starts_with(prefix))
        .map(|(_, i)| i.name.clone())
        .collect();
    names.sort();
    names
}

fn origins_of(db: &LayoutDB, master: MasterId) -> Vec<(i64, i64)> {
    let mut xs: Vec<(i64, i64)> = db
        .insts()
        .filter(|(_, i)| i.master == master)
        .map(|(_, i)| (i.origin.x, i.origin.y))
        .collect();
    xs.sort();
    xs
}

/// Largest stretch of any row not covered by a row-height cell.
fn largest_gap(db: &LayoutDB) -> i64 {
    let mut worst = 0;
    for row in &db.rows {
        let bbox = row.bbox();
        let spans: Vec<Span> = db
            .insts()
            .map(|(_, i)| db.placed_bbox(i))
            .filter(|b| b.height() <= ROW_H && b.min.y == bbox.min.y)
            .filter(|b| b.max.x > bbox.min.x && b.min.x < bbox.max.x)
            .map(|b| (b.min.x, b.max.x))
            .collect();
        for (lo, hi) in interval::subtract((bbox.min.x, bbox.max.x), &interval::merge(spans)) {
            worst = worst.max(hi - lo);
        }
    }
    worst
}

#[test]
fn taps_follow_the_pitch() {
    logger::init_for_tests();
    let mut db = LayoutDB::new();
    add_rows(&mut db, 1, 10);
    let tap = filler(&mut db, "TAPCELL", 1);
    let mut options = Options::default();
    options.set_master(Role::Tapcell, tap);
    options.dist = Some(40);

    let summary = Tapcell::init(&mut db).run(&options).unwrap();
    assert_eq!(summary.tapcells, 3);
    assert_eq!(origins_of(&db, tap), vec![(10, 0), (50, 0), (90, 0)]);
    assert_eq!(names_with_prefix(&db, "TAP_"), ["TAP_0", "TAP_1", "TAP_2"]);
}

#[test]
fn endcaps_take_the_row_ends() {
    logger::init_for_tests();
    let mut db = LayoutDB::new();
    add_rows(&mut db, 1, 10);
    let tap = filler(&mut db, "TAPCELL", 1);
    let endcap = filler(&mut db, "ENDCAP", 1);
    let mut options = Options::default();
    options
        .set_master(Role::Tapcell, tap)
        .set_master(Role::Endcap, endcap);
    options.dist = Some(40);

    let summary = Tapcell::init(&mut db).run(&options).unwrap();
    assert_eq!((summary.endcaps, summary.tapcells), (2, 2));
    assert_eq!(origins_of(&db, endcap), vec![(0, 0), (90, 0)]);
    // The candidate at 90 is already covered by the right endcap.
    assert_eq!(origins_of(&db, tap), vec![(10, 0), (50, 0)]);
    assert_eq!(names_with_prefix(&db, "PHY_EDGE_"), ["PHY_EDGE_0", "PHY_EDGE_1"]);
    assert_eq!(names_with_prefix(&db, "TAP_"), ["TAP_2", "TAP_3"]);

    let right = db.find_inst("PHY_EDGE_1").and_then(|id| db.inst(id)).unwrap();
    assert_eq!(right.orient, Orient::MY);
    assert_eq!(right.status, PlacementStatus::Fixed);
    assert!(largest_gap(&db) < 40);
}

#[test]
fn second_run_inserts_nothing() {
    logger::init_for_tests();
    let (mut db, options) = macro_design();
    let mut tapcell = Tapcell::init(&mut db);
    tapcell.cut_rows(&options);

    let first = tapcell.run(&options).unwrap();
    assert!(first.total() > 0);
    let second = tapcell.run(&options).unwrap();
    assert_eq!(second.total(), 0);
}

#[test]
fn macro_design_is_fully_closed() {
    logger::init_for_tests();
    let (mut db, options) = macro_design();
    let summary = {
        let mut tapcell = Tapcell::init(&mut db);
        let cut = tapcell.cut_rows(&options);
        assert_eq!((cut.rows_cut, cut.rows_after), (2, 8));
        tapcell.run(&options).unwrap()
    };

    assert_eq!(summary.endcaps, 16);
    assert_eq!(summary.top_bottom, 48);
    assert_eq!(summary.around_macros, 14);
    assert_eq!(summary.tapcells, 24);
    assert!(run_filler_check(&db).is_ok());
    assert!(largest_gap(&db) < 100);

    // Bottom row sits on the core edge: corner caps at both ends, upright on the left.
    let cnr = options.master(Role::CnrcapNwout).unwrap();
    let caps: Vec<(i64, i64, Orient)> = {
        let mut v: Vec<_> = db
            .insts()
            .filter(|(_, i)| i.master == cnr)
            .map(|(_, i)| (i.origin.x, i.origin.y, i.orient))
            .collect();
        v.sort_by_key(|c| (c.1, c.0));
        v
    };
    assert_eq!(
        caps,
        vec![
            (0, 0, Orient::R0),
            (980, 0, Orient::MY),
            (0, 500, Orient::MX),
            (980, 500, Orient::R180),
        ]
    );

    // Inner corners flank the macro in the rows just above and below it.
    let incnr = options.master(Role::IncnrcapNwout).unwrap();
    assert_eq!(
        origins_of(&db, incnr),
        vec![(380, 100), (380, 400), (600, 100), (600, 400)]
    );
    let ties = options.master(Role::TapNwouttie).unwrap();
    let over_macro = origins_of(&db, ties)
        .into_iter()
        .filter(|&(x, y)| y == 400 && (400..600).contains(&x))
        .count();
    assert_eq!(over_macro, 5);
}

/// Six rows of 1000 with a macro spanning the whole core over rows 2 and 3.
fn full_width_macro_design() -> (LayoutDB, Options) {
    let mut db = LayoutDB::new();
    add_rows(&mut db, 6, 100);
    let options = full_library(&mut db);
    let ram = db.add_master("RAM", 1000, 200, MasterClass::Block, Symmetry::NONE);
    db.create_inst("ram", ram, Point::new(0, 200), Orient::R0, PlacementStatus::Fixed)
        .unwrap();
    (db, options)
}

#[test]
fn full_width_macro_is_closed_on_both_sides() {
    logger::init_for_tests();
    let (mut db, options) = full_width_macro_design();
    let summary = {
        let mut tapcell = Tapcell::init(&mut db);
        let cut = tapcell.cut_rows(&options);
        assert_eq!((cut.rows_cut, cut.rows_after), (2, 4));
        tapcell.run(&options).unwrap()
    };

    assert_eq!(summary.endcaps, 8);
    assert_eq!(summary.top_bottom, 48);
    assert_eq!(summary.around_macros, 48);
    assert_eq!(summary.tapcells, 0);
    assert!(run_filler_check(&db).is_ok());
    assert_eq!(largest_gap(&db), 0);

    // Rows under and over the macro end in corner caps, not plain endcaps.
    let cnr = options.master(Role::CnrcapNwout).unwrap();
    let caps: Vec<(i64, i64, Orient)> = {
        let mut v: Vec<_> = db
            .insts()
            .filter(|(_, i)| i.master == cnr && (i.origin.y == 100 || i.origin.y == 400))
            .map(|(_, i)| (i.origin.x, i.origin.y, i.orient))
            .collect();
        v.sort_by_key(|c| (c.1, c.0));
        v
    };
    assert_eq!(
        caps,
        vec![
            (0, 100, Orient::MX),
            (980, 100, Orient::R180),
            (0, 400, Orient::R0),
            (980, 400, Orient::MY),
        ]
    );
    assert!(origins_of(&db, options.master(Role::Endcap).unwrap()).is_empty());

    let ties = origins_of(&db, options.master(Role::TapNwouttie).unwrap());
    for y in [100, 400] {
        let in_row: Vec<i64> = ties.iter().filter(|o| o.1 == y).map(|o| o.0).collect();
        assert_eq!(in_row.len(), 24);
        assert_eq!(in_row.first(), Some(&20));
        assert_eq!(in_row.last(), Some(&940));
    }
    // No room for inner corners when the macro touches both core sides.
    assert!(origins_of(&db, options.master(Role::IncnrcapNwout).unwrap()).is_empty());
}

#[test]
fn full_width_macro_without_cutting() {
    logger::init_for_tests();
    let (mut cut_db, options) = full_width_macro_design();
    let cut = {
        let mut tapcell = Tapcell::init(&mut cut_db);
        tapcell.cut_rows(&options);
        tapcell.run(&options).unwrap()
    };

    let (mut db, options) = full_width_macro_design();
    let uncut = Tapcell::init(&mut db).run(&options).unwrap();
    assert_eq!(uncut, cut);
    assert_eq!(largest_gap(&cut_db), 0);
}

#[test]
fn remove_cells_round_trip() {
    logger::init_for_tests();
    let (mut db, options) = macro_design();
    let mut tapcell = Tapcell::init(&mut db);
    tapcell.cut_rows(&options);
    let summary = tapcell.run(&options).unwrap();

    assert_eq!(tapcell.remove_cells(""), 0);
    assert_eq!(tapcell.remove_cells("TAP_"), summary.tapcells);
    assert!(names_with_prefix(tapcell.db(), "TAP_").is_empty());

    let tap = options.master(Role::Tapcell).unwrap();
    let tap_boxes: Vec<_> = tapcell
        .db()
        .insts()
        .filter(|(_, i)| i.master == tap)
        .collect();
    assert!(tap_boxes.is_empty());

    // Stack 1 keeps its caps and ties but the tap slots are free again.
    let fills = tapcell.find_row_fills(&options);
    assert!(!fills.is_filled(100, 110, 120));
    assert!(fills.is_filled(100, 0, 20));

    let edge = summary.endcaps + summary.top_bottom + summary.around_macros;
    assert_eq!(tapcell.remove_cells("PHY_EDGE_"), edge);
    assert!(tapcell.find_row_fills(&options).is_empty());
    assert_eq!(tapcell.db().num_insts(), 1);
}

#[test]
fn boundary_cells_need_the_full_set() {
    logger::init_for_tests();
    let (mut db, mut options) = macro_design();
    options.incnrcap_nwout_master = None;
    assert!(!options.add_boundary_cells());

    let summary = {
        let mut tapcell = Tapcell::init(&mut db);
        tapcell.cut_rows(&options);
        tapcell.run(&options).unwrap()
    };
    assert_eq!((summary.top_bottom, summary.around_macros), (0, 0));

    let tie_names = ["TAP_NW", "INCNRCAP"];
    for (_, inst) in db.insts() {
        let master = &db.master(inst.master).name;
        assert!(
            !tie_names.iter().any(|p| master.starts_with(p)),
            "unexpected {}",
            master
        );
    }
    // Corner caps do not depend on the boundary set.
    assert_eq!(origins_of(&db, options.master(Role::CnrcapNwout).unwrap()).len(), 4);
}

#[test]
fn unplaceable_endcap_inserts_nothing() {
    logger::init_for_tests();
    let mut db = LayoutDB::new();
    add_rows(&mut db, 2, 20);
    let tap = filler(&mut db, "TAPCELL", 1);
    // No X symmetry: cannot sit in the MX row.
    let endcap = db.add_master("ENDCAP", 20, ROW_H, MasterClass::EndcapPre, Symmetry::NONE);
    let mut options = Options::default();
    options
        .set_master(Role::Tapcell, tap)
        .set_master(Role::Endcap, endcap);

    let mut tapcell = Tapcell::init(&mut db);
    let err = tapcell.run(&options).unwrap_err();
    assert!(matches!(err, TapcellError::Symmetry { role: Role::Endcap, .. }));
    assert_eq!(tapcell.db().num_insts(), 0);
    assert_eq!(tapcell.phy_idx(), 0);
}

#[test]
fn names_skip_existing_instances() {
    logger::init_for_tests();
    let mut db = LayoutDB::new();
    add_rows(&mut db, 1, 10);
    let tap = filler(&mut db, "TAPCELL", 1);
    let other = filler(&mut db, "OTHER", 1);
    db.create_inst("TAP_0", other, Point::new(500, 500), Orient::R0, PlacementStatus::Placed)
        .unwrap();
    let mut options = Options::default();
    options.set_master(Role::Tapcell, tap);
    options.dist = Some(40);

    let mut tapcell = Tapcell::init(&mut db);
    tapcell.run(&options).unwrap();
    assert_eq!(tapcell.phy_idx(), 4);
    assert_eq!(
        names_with_prefix(tapcell.db(), "TAP_"),
        ["TAP_0", "TAP_1", "TAP_2", "TAP_3"]
    );

    tapcell.reset();
    assert_eq!(tapcell.phy_idx(), 0);
    assert_eq!(tapcell.tap_prefix(), "TAP_");
}

#[test]
fn generated_floorplan_passes_check() {
    logger::init_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let lef = dir.path().join("tech.lef");
    let def = dir.path().join("floorplan.def");
    let params = FloorplanParams {
        num_rows: 20,
        sites_per_row: 300,
        num_macros: 2,
        ..FloorplanParams::default()
    };
    generator::generate_library_lef(lef.to_str().unwrap(), &params).unwrap();
    generator::generate_random_floorplan(def.to_str().unwrap(), &params).unwrap();

    let mut db = LayoutDB::new();
    tap_common::db::parser::lef::parse(&mut db, lef.to_str().unwrap()).unwrap();
    tap_common::db::parser::def::parse(&mut db, def.to_str().unwrap()).unwrap();

    let config: Config = toml::from_str(
        r#"
        [tapcell]
        tapcell_master = "TAPCELL"
        endcap_master = "ENDCAP"
        cnrcap_nwin_master = "CNRCAP_NWIN"
        cnrcap_nwout_master = "CNRCAP_NWOUT"
        tap_nwintie_master = "TAP_NWINTIE"
        tap_nwin2_master = "TAP_NWIN2"
        tap_nwin3_master = "TAP_NWIN3"
        tap_nwouttie_master = "TAP_NWOUTTIE"
        tap_nwout2_master = "TAP_NWOUT2"
        tap_nwout3_master = "TAP_NWOUT3"
        incnrcap_nwin_master = "INCNRCAP_NWIN"
        incnrcap_nwout_master = "INCNRCAP_NWOUT"
        distance = 10.0
        "#,
    )
    .unwrap();
    let options = Options::from_config(&config.tapcell, &db).unwrap();
    assert_eq!(options.dist, Some(10_000));

    let mut tapcell = Tapcell::init(&mut db);
    tapcell.cut_rows(&options);
    let summary = tapcell.run(&options).unwrap();
    assert!(summary.tapcells > 0 && summary.endcaps > 0);
    assert_eq!(tapcell.run(&options).unwrap().total(), 0);
    assert!(run_filler_check(tapcell.db()).is_ok());
}
