use crate::db::core::{LayoutDB, PlacementStatus};
use std::fs::File;
use std::io::{BufWriter, Write};

pub fn save_def(db: &LayoutDB, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    write_def(db, &mut writer)?;
    writer.flush()
}

pub fn write_def<W: Write>(db: &LayoutDB, file: &mut W) -> std::io::Result<()> {
    writeln!(file, "VERSION 5.8 ;")?;
    writeln!(file, "DIVIDERCHAR \"/\" ;")?;
    writeln!(file, "BUSBITCHARS \"[]\" ;")?;
    writeln!(file, "DESIGN {} ;", db.design)?;
    writeln!(file, "UNITS DISTANCE MICRONS {} ;", db.dbu_per_micron)?;

    let die = db.die_area;
    writeln!(
        file,
        "DIEAREA ( {} {} ) ( {} {} ) ;",
        die.min.x, die.min.y, die.max.x, die.max.y
    )?;
    writeln!(file)?;

    for row in &db.rows {
        writeln!(
            file,
            "ROW {} {} {} {} {} DO {} BY 1 STEP {} 0 ;",
            row.name,
            row.site,
            row.origin.x,
            row.origin.y,
            row.orient.def_name(),
            row.num_sites,
            row.site_width
        )?;
    }
    writeln!(file)?;

    writeln!(file, "COMPONENTS {} ;", db.num_insts())?;
    for (_, inst) in db.insts() {
        let master = &db.master(inst.master).name;
        if inst.status == PlacementStatus::Unplaced {
            writeln!(file, "- {} {} ;", inst.name, master)?;
        } else {
            writeln!(
                file,
                "- {} {} + {} ( {} {} ) {} ;",
                inst.name,
                master,
                inst.status.def_name(),
                inst.origin.x,
                inst.origin.y,
                inst.orient.def_name()
            )?;
        }
    }
    writeln!(file, "END COMPONENTS")?;
    writeln!(file)?;
    writeln!(file, "END DESIGN")?;
    Ok(())
}
