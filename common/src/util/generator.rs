use crate::geom::rect::Rect;
use rand::Rng;
use std::fs::File;
use std::io::Write;

/// Shape of a random floorplan benchmark, all lengths in DBU.
#[derive(Clone, Debug)]
pub struct FloorplanParams {
    pub site_name: String,
    pub site_width: i64,
    pub site_height: i64,
    pub num_rows: usize,
    pub sites_per_row: i64,
    pub macro_master: String,
    pub macro_width: i64,
    pub macro_height: i64,
    pub num_macros: usize,
}

impl Default for FloorplanParams {
    fn default() -> Self {
        Self {
            site_name: "core".to_string(),
            site_width: 200,
            site_height: 1200,
            num_rows: 40,
            sites_per_row: 500,
            macro_master: "RAM".to_string(),
            macro_width: 20000,
            macro_height: 12000,
            num_macros: 3,
        }
    }
}

/// Writes a DEF with alternating N/FS rows and non-overlapping macros snapped to the
/// row grid. Returns the macro boxes that were placed.
pub fn generate_random_floorplan(
    filename: &str,
    params: &FloorplanParams,
) -> std::io::Result<Vec<Rect>> {
    let mut file = File::create(filename)?;
    let mut rng = rand::thread_rng();

    let margin = params.site_height;
    let core_w = params.sites_per_row * params.site_width;
    let core_h = params.num_rows as i64 * params.site_height;
    let die_w = core_w + 2 * margin;
    let die_h = core_h + 2 * margin;

    log::info!(
        "Generating Floorplan: {} rows x {} sites, {} macros, Die: {}x{}",
        params.num_rows,
        params.sites_per_row,
        params.num_macros,
        die_w,
        die_h
    );

    let mut macros: Vec<Rect> = Vec::new();
    let max_col = (core_w - params.macro_width) / params.site_width;
    let max_row = (core_h - params.macro_height) / params.site_height;
    if max_col > 0 && max_row > 0 {
        for _ in 0..params.num_macros {
            for _attempt in 0..100 {
                let x = margin + rng.gen_range(0..=max_col) * params.site_width;
                let y = margin + rng.gen_range(0..=max_row) * params.site_height;
                let candidate = Rect::from_coords(
                    x,
                    y,
                    x + params.macro_width,
                    y + params.macro_height,
                );
                let spaced = candidate.bloat(params.site_height, params.site_height);
                if macros.iter().all(|m| !m.overlaps(&spaced)) {
                    macros.push(candidate);
                    break;
                }
            }
        }
    }
    if macros.len() < params.num_macros {
        log::warn!(
            "Only {} of {} macros fit in the core",
            macros.len(),
            params.num_macros
        );
    }

    writeln!(file, "VERSION 5.8 ;")?;
    writeln!(file, "DIVIDERCHAR \"/\" ;")?;
    writeln!(file, "BUSBITCHARS \"[]\" ;")?;
    writeln!(file, "DESIGN floorplan_demo ;")?;
    writeln!(file, "UNITS DISTANCE MICRONS 1000 ;")?;
    writeln!(file, "DIEAREA ( 0 0 ) ( {} {} ) ;", die_w, die_h)?;

    for r in 0..params.num_rows {
        let orient = if r % 2 == 0 { "N" } else { "FS" };
        writeln!(
            file,
            "ROW ROW_{} {} {} {} {} DO {} BY 1 STEP {} 0 ;",
            r,
            params.site_name,
            margin,
            margin + r as i64 * params.site_height,
            orient,
            params.sites_per_row,
            params.site_width
        )?;
    }

    writeln!(file, "COMPONENTS {} ;", macros.len())?;
    for (i, m) in macros.iter().enumerate() {
        writeln!(
            file,
            "- macro{} {} + FIXED ( {} {} ) N ;",
            i, params.macro_master, m.min.x, m.min.y
        )?;
    }
    writeln!(file, "END COMPONENTS")?;
    writeln!(file, "END DESIGN")?;
    Ok(macros)
}

/// Writes a LEF library matching `params`: the core site, the macro, and one
/// master for every tapcell role. Cell widths are whole sites and every filler is
/// symmetric in X and Y so it fits both row orientations.
pub fn generate_library_lef(filename: &str, params: &FloorplanParams) -> std::io::Result<()> {
    let mut file = File::create(filename)?;
    let um = |dbu: i64| dbu as f64 / 1000.0;
    let site_w = params.site_width;
    let row_h = um(params.site_height);

    writeln!(file, "VERSION 5.8 ;")?;
    writeln!(file, "UNITS\n  DATABASE MICRONS 1000 ;\nEND UNITS")?;
    writeln!(
        file,
        "SITE {}\n  CLASS CORE ;\n  SIZE {:.3} BY {:.3} ;\nEND {}",
        params.site_name,
        um(site_w),
        row_h,
        params.site_name
    )?;

    let cells: [(&str, &str, i64); 12] = [
        ("TAPCELL", "CORE WELLTAP", 2),
        ("ENDCAP", "ENDCAP PRE", 2),
        ("CNRCAP_NWIN", "ENDCAP PRE", 2),
        ("CNRCAP_NWOUT", "ENDCAP PRE", 2),
        ("TAP_NWINTIE", "CORE WELLTAP", 4),
        ("TAP_NWIN2", "CORE WELLTAP", 2),
        ("TAP_NWIN3", "CORE WELLTAP", 3),
        ("TAP_NWOUTTIE", "CORE WELLTAP", 4),
        ("TAP_NWOUT2", "CORE WELLTAP", 2),
        ("TAP_NWOUT3", "CORE WELLTAP", 3),
        ("INCNRCAP_NWIN", "ENDCAP PRE", 2),
        ("INCNRCAP_NWOUT", "ENDCAP PRE", 2),
    ];
    for (name, class, sites) in cells {
        writeln!(
            file,
            "MACRO {}\n  CLASS {} ;\n  SIZE {:.3} BY {:.3} ;\n  SYMMETRY X Y ;\nEND {}",
            name,
            class,
            um(sites * site_w),
            row_h,
            name
        )?;
    }

    writeln!(
        file,
        "MACRO {}\n  CLASS BLOCK ;\n  SIZE {:.3} BY {:.3} ;\nEND {}",
        params.macro_master,
        um(params.macro_width),
        um(params.macro_height),
        params.macro_master
    )?;
    writeln!(file, "END LIBRARY")?;
    Ok(())
}
