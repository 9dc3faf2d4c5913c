use std::path::{Path, PathBuf};

use image::RgbaImage;
use statcard::text::{Align, Gravity, TextPainter, TextStyle};

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const CANVAS_WIDTH: u32 = 1080;
const CANVAS_HEIGHT: u32 = 600;
const SAMPLE: &str = "HHH";

fn system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

fn setup() -> Option<(TextPainter, PathBuf)> {
    let Some(font) = system_font() else {
        eprintln!("skipping: no TrueType font found on this system");
        return None;
    };
    Some((TextPainter::new(), font))
}

/// Inked bounding box `(min_x, min_y, max_x, max_y)` of one drawn line.
fn ink_bounds(
    painter: &mut TextPainter,
    font: &Path,
    gravity: Gravity,
    align: Align,
    x: f32,
    y: f32,
) -> (u32, u32, u32, u32) {
    let mut canvas = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let style = TextStyle {
        point_size: 48.0,
        font: Some(font.to_path_buf()),
        gravity,
        align,
        ..TextStyle::default()
    };
    painter
        .draw(&mut canvas, SAMPLE, &style, x, y)
        .expect("text should draw");

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (px, py, pixel) in canvas.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (px, py, px, py),
            Some((x0, y0, x1, y1)) => (x0.min(px), y0.min(py), x1.max(px), y1.max(py)),
        });
    }
    bounds.expect("text should leave ink on the canvas")
}

#[test]
fn left_alignment_starts_at_x_on_the_baseline() {
    let Some((mut painter, font)) = setup() else {
        return;
    };
    let (min_x, min_y, _, max_y) =
        ink_bounds(&mut painter, &font, Gravity::Undefined, Align::Left, 100.0, 300.0);
    assert!(min_x >= 99, "ink starts at {min_x}");
    assert!(min_x < 140, "ink starts at {min_x}");
    assert!(min_y < 300);
    assert!(max_y <= 301, "ink bottom {max_y} should sit on the baseline");
}

#[test]
fn center_alignment_straddles_x() {
    let Some((mut painter, font)) = setup() else {
        return;
    };
    let (min_x, _, max_x, _) =
        ink_bounds(&mut painter, &font, Gravity::Undefined, Align::Center, 300.0, 300.0);
    assert!(min_x < 300 && max_x > 300, "ink spans {min_x}..={max_x}");
}

#[test]
fn right_alignment_ends_at_x() {
    let Some((mut painter, font)) = setup() else {
        return;
    };
    let (min_x, _, max_x, _) =
        ink_bounds(&mut painter, &font, Gravity::Undefined, Align::Right, 600.0, 300.0);
    assert!(max_x <= 600, "ink ends at {max_x}");
    assert!(min_x < 600 && max_x > 540, "ink spans {min_x}..={max_x}");
}

#[test]
fn vertical_gravity_orders_the_line_around_y() {
    let Some((mut painter, font)) = setup() else {
        return;
    };
    let (_, north_top, _, _) =
        ink_bounds(&mut painter, &font, Gravity::North, Align::Left, 0.0, 300.0);
    let (_, center_top, _, _) =
        ink_bounds(&mut painter, &font, Gravity::Center, Align::Left, 100.0, 300.0);
    let (_, south_top, _, south_bottom) =
        ink_bounds(&mut painter, &font, Gravity::South, Align::Left, 100.0, 300.0);

    assert!(north_top >= 300, "north ink top {north_top} should be below y");
    assert!(south_bottom < 300, "south ink bottom {south_bottom} should be above y");
    assert!(
        south_top < center_top && center_top < north_top,
        "tops: south {south_top}, center {center_top}, north {north_top}"
    );
}

#[test]
fn north_gravity_offsets_x_from_canvas_centre() {
    let Some((mut painter, font)) = setup() else {
        return;
    };
    let centre = CANVAS_WIDTH / 2;

    let (left_min, _, _, _) =
        ink_bounds(&mut painter, &font, Gravity::North, Align::Left, 0.0, 100.0);
    assert!(left_min >= centre - 1, "ink starts at {left_min}");

    let (min_x, _, max_x, _) =
        ink_bounds(&mut painter, &font, Gravity::North, Align::Center, 0.0, 100.0);
    assert!(min_x < centre && max_x > centre, "ink spans {min_x}..={max_x}");

    let (shifted_min, _, _, _) =
        ink_bounds(&mut painter, &font, Gravity::North, Align::Left, -200.0, 100.0);
    assert!(shifted_min + 202 >= left_min && shifted_min + 198 <= left_min);
}
