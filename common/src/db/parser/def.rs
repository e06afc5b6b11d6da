use crate::db::core::{LayoutDB, Orient, PlacementStatus, RowData};
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use anyhow::{Context, Result, anyhow, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Reads the floorplan (units, die area, rows) and placed components of a DEF file.
/// Masters and sites referenced by the DEF must already be in the database.
pub fn parse(db: &mut LayoutDB, filename: &str) -> Result<()> {
    let file = File::open(filename).with_context(|| format!("Failed to open DEF: {}", filename))?;
    parse_reader(db, BufReader::new(file))
}

pub fn parse_reader<R: BufRead>(db: &mut LayoutDB, reader: R) -> Result<()> {
    let mut in_components = false;
    let mut pending: Vec<String> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() || parts[0].starts_with('#') {
            continue;
        }

        if in_components && (parts[0] == "-" || !pending.is_empty()) {
            pending.extend(parts.iter().map(|p| p.to_string()));
            if pending.last().is_some_and(|t| t.ends_with(';')) {
                let statement = std::mem::take(&mut pending);
                parse_component(db, &statement)
                    .with_context(|| format!("line {}: bad component", line_no + 1))?;
            }
            continue;
        }

        match parts[0] {
            "DESIGN" => {
                if let Some(name) = parts.get(1) {
                    db.design = name.to_string();
                }
            }
            "UNITS" => {
                let units = parts
                    .get(3)
                    .and_then(|v| v.trim_end_matches(';').parse::<i64>().ok())
                    .ok_or_else(|| anyhow!("line {}: malformed UNITS", line_no + 1))?;
                if units != db.dbu_per_micron {
                    log::info!(
                        "DEF units {} differ from library units {}; rescaling library",
                        units,
                        db.dbu_per_micron
                    );
                    db.set_dbu_per_micron(units);
                }
            }
            "DIEAREA" => {
                let nums = numbers(&parts);
                if nums.len() < 4 {
                    bail!("line {}: malformed DIEAREA", line_no + 1);
                }
                db.die_area = Rect::from_coords(nums[0], nums[1], nums[2], nums[3]);
            }
            "ROW" => {
                let row = parse_row(db, &parts)
                    .with_context(|| format!("line {}: bad ROW", line_no + 1))?;
                db.add_row(row);
            }
            "COMPONENTS" => in_components = true,
            "END" => {
                if parts.get(1) == Some(&"COMPONENTS") {
                    in_components = false;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn numbers(parts: &[&str]) -> Vec<i64> {
    parts
        .iter()
        .filter_map(|p| p.trim_end_matches(';').parse::<i64>().ok())
        .collect()
}

// ROW name site x y orient [DO n BY 1 [STEP sx sy]] ;
fn parse_row(db: &LayoutDB, parts: &[&str]) -> Result<RowData> {
    if parts.len() < 6 {
        bail!("expected ROW name site x y orient");
    }
    let site = parts[2].to_string();
    let (site_w, site_h) = *db
        .sites
        .get(&site)
        .ok_or_else(|| anyhow!("unknown site '{}'", site))?;
    let x: i64 = parts[3].parse()?;
    let y: i64 = parts[4].parse()?;
    let orient = Orient::from_def_name(parts[5].trim_end_matches(';'))
        .ok_or_else(|| anyhow!("unknown orientation '{}'", parts[5]))?;

    let mut num_sites = 1;
    let mut step = site_w;
    let mut i = 6;
    while i < parts.len() {
        match parts[i] {
            "DO" if i + 1 < parts.len() => {
                num_sites = parts[i + 1].parse()?;
                i += 1;
            }
            "STEP" if i + 1 < parts.len() => {
                let sx: i64 = parts[i + 1].parse()?;
                if sx > 0 {
                    step = sx;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    Ok(RowData {
        name: parts[1].to_string(),
        site,
        origin: Point::new(x, y),
        orient,
        num_sites,
        site_width: step,
        site_height: site_h,
    })
}

// - name master [+ PLACED|FIXED ( x y ) orient] ... ;
fn parse_component(db: &mut LayoutDB, tokens: &[String]) -> Result<()> {
    if tokens.len() < 3 {
        bail!("expected '- name master'");
    }
    let name = &tokens[1];
    let master_name = tokens[2].trim_end_matches(';');
    let master = db
        .find_master(master_name)
        .ok_or_else(|| anyhow!("component {} uses unknown master {}", name, master_name))?;

    let mut status = PlacementStatus::Unplaced;
    let mut origin = Point::new(0, 0);
    let mut orient = Orient::R0;

    for (i, tok) in tokens.iter().enumerate() {
        let kind = match tok.as_str() {
            "PLACED" => PlacementStatus::Placed,
            "FIXED" | "COVER" => PlacementStatus::Fixed,
            _ => continue,
        };
        if i + 5 >= tokens.len() || tokens[i + 1] != "(" || tokens[i + 4] != ")" {
            bail!("malformed placement for {}", name);
        }
        status = kind;
        origin = Point::new(tokens[i + 2].parse()?, tokens[i + 3].parse()?);
        let o = tokens[i + 5].trim_end_matches(';');
        orient = Orient::from_def_name(o).ok_or_else(|| anyhow!("unknown orientation '{}'", o))?;
    }

    db.create_inst(name, master, origin, orient, status)?;
    Ok(())
}
