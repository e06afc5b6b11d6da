use crate::db::core::{LayoutDB, MasterClass};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

/// Renders rows, macros and row-height cells. Tap cells and boundary cells get
/// distinct colors so their spacing can be inspected by eye.
pub fn draw_floorplan(db: &LayoutDB, filename: &str, width: u32, height: u32) {
    let mut img = RgbImage::from_pixel(width, height, Rgb([20, 20, 20]));

    let area = match db.core_area() {
        Some(core) if db.die_area.width() <= 0 => core,
        _ => db.die_area,
    };
    if area.width() <= 0 || area.height() <= 0 {
        return;
    }

    let scale_x = width as f64 / area.width() as f64;
    let scale_y = height as f64 / area.height() as f64;

    let to_image = |r: crate::geom::rect::Rect| {
        let x = (r.min.x - area.min.x) as f64 * scale_x;
        let y_top = height as f64 - (r.max.y - area.min.y) as f64 * scale_y;
        let w = (r.width() as f64 * scale_x).max(1.0);
        let h = (r.height() as f64 * scale_y).max(1.0);
        ImageRect::at(x as i32, y_top as i32).of_size(w as u32, h as u32)
    };

    let color_row = Rgb([60, 60, 70]);
    let color_macro = Rgb([180, 120, 40]);
    let color_tap = Rgb([60, 180, 90]);
    let color_edge = Rgb([200, 60, 60]);
    let color_other = Rgb([90, 90, 160]);

    for row in &db.rows {
        draw_hollow_rect_mut(&mut img, to_image(row.bbox()), color_row);
    }

    let row_height = db.row_height().unwrap_or(i64::MAX);
    for (_, inst) in db.insts() {
        let bbox = db.placed_bbox(inst);
        let master = db.master(inst.master);
        let color = if bbox.height() > row_height {
            color_macro
        } else {
            match master.class {
                MasterClass::CoreWelltap => color_tap,
                MasterClass::EndcapPre | MasterClass::EndcapPost => color_edge,
                _ => color_other,
            }
        };
        draw_filled_rect_mut(&mut img, to_image(bbox), color);
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("Could not write image {}: {}", filename, e);
    }
}
