use crate::db::core::{LayoutDB, MasterClass, Symmetry};
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};

struct PendingMacro {
    name: String,
    class: MasterClass,
    size: Option<(f64, f64)>,
    symmetry: Symmetry,
}

/// Reads sites and macro footprints from a LEF file. Sizes are converted with the
/// database's current `dbu_per_micron`, which a `DATABASE MICRONS` statement updates.
pub fn parse(db: &mut LayoutDB, filename: &str) -> Result<()> {
    let file = File::open(filename).with_context(|| format!("Failed to open LEF: {}", filename))?;
    parse_reader(db, BufReader::new(file))
}

pub fn parse_reader<R: BufRead>(db: &mut LayoutDB, reader: R) -> Result<()> {
    let mut current_site: Option<String> = None;
    let mut current_macro: Option<PendingMacro> = None;
    let mut in_units = false;
    let mut nested: Vec<String> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let parts: Vec<&str> = line
            .split_whitespace()
            .take_while(|p| !p.starts_with('#'))
            .collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "UNITS" => in_units = true,
            "DATABASE" if in_units => {
                if let Some(val) = parts.get(2).and_then(|v| v.parse::<i64>().ok()) {
                    db.dbu_per_micron = val;
                    log::info!("LEF database units: {} per micron", val);
                }
            }
            "SITE" if current_macro.is_none() && nested.is_empty() => {
                current_site = parts.get(1).map(|s| s.to_string());
            }
            "MACRO" => {
                let Some(name) = parts.get(1) else {
                    bail!("line {}: MACRO without a name", line_no + 1);
                };
                current_macro = Some(PendingMacro {
                    name: name.to_string(),
                    class: MasterClass::Core,
                    size: None,
                    symmetry: Symmetry::NONE,
                });
            }
            "PIN" if current_macro.is_some() => {
                if let Some(pin) = parts.get(1) {
                    nested.push(pin.to_string());
                }
            }
            "CLASS" => {
                if let Some(m) = current_macro.as_mut() {
                    if nested.is_empty() {
                        let class = parts.get(1).map(|c| c.trim_end_matches(';')).unwrap_or("");
                        let sub = parts.get(2).map(|c| c.trim_end_matches(';'));
                        m.class = MasterClass::from_lef(class, sub.filter(|s| !s.is_empty()));
                    }
                }
            }
            "SYMMETRY" => {
                if let Some(m) = current_macro.as_mut() {
                    for flag in &parts[1..] {
                        match flag.trim_end_matches(';') {
                            "X" => m.symmetry.x = true,
                            "Y" => m.symmetry.y = true,
                            "R90" => m.symmetry.r90 = true,
                            _ => {}
                        }
                    }
                }
            }
            "SIZE" => {
                if parts.len() < 4 {
                    bail!("line {}: malformed SIZE statement", line_no + 1);
                }
                let w: f64 = parts[1]
                    .parse()
                    .with_context(|| format!("line {}: bad SIZE width", line_no + 1))?;
                let h: f64 = parts[3]
                    .trim_end_matches(';')
                    .parse()
                    .with_context(|| format!("line {}: bad SIZE height", line_no + 1))?;
                if let Some(m) = current_macro.as_mut() {
                    m.size = Some((w, h));
                } else if let Some(site) = &current_site {
                    let size = (db.microns_to_dbu(w), db.microns_to_dbu(h));
                    db.sites.insert(site.clone(), size);
                }
            }
            "END" => {
                let Some(&name) = parts.get(1) else {
                    continue;
                };
                if in_units && name == "UNITS" {
                    in_units = false;
                } else if nested.last().is_some_and(|n| n == name) {
                    nested.pop();
                } else if current_macro.as_ref().is_some_and(|m| m.name == name) {
                    if let Some(m) = current_macro.take() {
                        finish_macro(db, m);
                    }
                    nested.clear();
                } else if current_site.as_deref() == Some(name) {
                    current_site = None;
                }
            }
            _ => {}
        }
    }

    if let Some(m) = current_macro {
        log::warn!("LEF ended inside MACRO {}", m.name);
        finish_macro(db, m);
    }
    Ok(())
}

fn finish_macro(db: &mut LayoutDB, m: PendingMacro) {
    let Some((w, h)) = m.size else {
        log::warn!("MACRO {} has no SIZE; skipped", m.name);
        return;
    };
    let (w, h) = (db.microns_to_dbu(w), db.microns_to_dbu(h));
    db.add_master(&m.name, w, h, m.class, m.symmetry);
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEF: &str = "\
UNITS
  DATABASE MICRONS 1000 ;
END UNITS
SITE core
  CLASS CORE ;
  SIZE 0.2 BY 1.2 ;
END core
MACRO TAPCELL
  CLASS CORE WELLTAP ;
  SIZE 0.4 BY 1.2 ;
  SYMMETRY X Y ;
  PIN VDD
    USE POWER ;
  END VDD
END TAPCELL
MACRO ENDCAP
  CLASS ENDCAP PRE ;
  SIZE 0.6 BY 1.2 ;
  SYMMETRY X ;
END ENDCAP
MACRO RAM
  CLASS BLOCK ;
  SIZE 20 BY 12 ;
END RAM
";

    #[test]
    fn reads_sites_and_macros() {
        let mut db = LayoutDB::new();
        parse_reader(&mut db, LEF.as_bytes()).unwrap();

        assert_eq!(db.sites.get("core"), Some(&(200, 1200)));
        let tap = db.master(db.find_master("TAPCELL").unwrap());
        assert_eq!((tap.width, tap.height), (400, 1200));
        assert_eq!(tap.class, MasterClass::CoreWelltap);
        assert_eq!(tap.symmetry, Symmetry::XY);

        let endcap = db.master(db.find_master("ENDCAP").unwrap());
        assert!(endcap.symmetry.x && !endcap.symmetry.y);
        assert_eq!(endcap.class, MasterClass::EndcapPre);

        let ram = db.master(db.find_master("RAM").unwrap());
        assert_eq!((ram.width, ram.height, ram.class), (20000, 12000, MasterClass::Block));
    }
}
