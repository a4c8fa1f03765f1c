//! Render a joined population table as a multi-series line chart (**SVG** or **PNG**).
//!
//! - One color per prefecture, in selection order
//! - Years missing from a prefecture's series break its line into separate segments
//! - Y axis scaled to thousands / millions with grouped tick labels

use crate::join::JoinedRow;
use crate::models::Category;
use crate::regions::romanize;
use ab_glyph::{Font, FontRef};
use anyhow::{Context, Result, anyhow};
use num_format::{Locale, ToFormattedString};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Font file used for chart text instead of the discovered one.
pub const ENV_FONT: &str = "PREFPOP_FONT";

/// Japanese-capable fonts commonly installed on Linux, macOS and Windows.
const SYSTEM_CJK_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/opentype/ipaexfont-gothic/ipaexg.ttf",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/usr/share/fonts/truetype/takao-gothic/TakaoGothic.ttf",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "C:\\Windows\\Fonts\\YuGothM.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
];

/// Latin-only fallback; names it cannot draw are romanized in bitmap output.
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// The "sans-serif" face registered for the `ab_glyph` text path, which does not
/// discover OS fonts. Chosen once per process.
static CHART_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

fn load_font_file(path: &Path) -> Result<(&'static [u8], FontRef<'static>)> {
    let bytes = std::fs::read(path).with_context(|| format!("read font {}", path.display()))?;
    // Registered fonts live for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    let face = FontRef::try_from_slice(bytes)
        .map_err(|_| anyhow!("{} is not a usable font", path.display()))?;
    Ok((bytes, face))
}

fn register(bytes: &'static [u8]) {
    let _ = plotters::style::register_font("sans-serif", plotters::style::FontStyle::Normal, bytes);
}

fn discover_font() -> Option<(&'static [u8], FontRef<'static>)> {
    let configured = std::env::var_os(ENV_FONT).map(PathBuf::from);
    let candidates = configured
        .iter()
        .map(PathBuf::as_path)
        .chain(SYSTEM_CJK_FONTS.iter().map(Path::new));
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match load_font_file(path) {
            Ok(font) => {
                log::debug!("chart font {}", path.display());
                return Some(font);
            }
            Err(e) => log::warn!("{e:#}"),
        }
    }
    log::debug!("no Japanese font found, using the bundled one");
    let face = FontRef::try_from_slice(BUNDLED_FONT).ok()?;
    Some((BUNDLED_FONT, face))
}

fn chart_font() -> Option<&'static FontRef<'static>> {
    CHART_FONT
        .get_or_init(|| {
            let (bytes, face) = discover_font()?;
            register(bytes);
            Some(face)
        })
        .as_ref()
}

/// Draw chart text with the font at `path`, e.g. one covering Japanese names.
///
/// Takes effect only before the first chart is drawn.
pub fn use_font_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let (bytes, face) = load_font_file(path.as_ref())?;
    CHART_FONT
        .set(Some(face))
        .map_err(|_| anyhow!("chart font already chosen"))?;
    register(bytes);
    Ok(())
}

fn can_draw(font: &FontRef<'_>, text: &str) -> bool {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| font.glyph_id(c).0 != 0)
}

/// Legend text for `name`: the name itself if `font` has its glyphs, otherwise the
/// romanized prefecture name when one is known.
fn legend_label<'a>(name: &'a str, font: &FontRef<'_>) -> &'a str {
    if can_draw(font, name) {
        return name;
    }
    romanize(name).unwrap_or(name)
}

/// Microsoft Office (2013+) chart series palette.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue
    RGBColor(237, 125, 49),  // orange
    RGBColor(165, 165, 165), // gray
    RGBColor(255, 192, 0),   // gold
    RGBColor(91, 155, 213),  // light blue
    RGBColor(112, 173, 71),  // green
    RGBColor(38, 68, 120),   // dark blue
    RGBColor(158, 72, 14),   // dark orange
    RGBColor(99, 99, 99),    // dark gray
    RGBColor(153, 115, 0),   // brownish gold
];

#[inline]
fn series_color(idx: usize) -> RGBAColor {
    OFFICE10[idx % OFFICE10.len()].to_rgba()
}

/// Pick a Y-axis scale and its label from the largest value, e.g. `(1e6, "millions")`.
pub fn choose_axis_scale(max_abs: f64) -> (f64, &'static str) {
    if max_abs >= 1.0e6 {
        (1.0e6, "millions")
    } else if max_abs >= 1.0e3 {
        (1.0e3, "thousands")
    } else {
        (1.0, "")
    }
}

/// Contiguous runs of `name`'s values across `rows`, scaled by `scale`.
///
/// A row without a column for `name` ends the current run.
pub fn segments(rows: &[JoinedRow], name: &str, scale: f64) -> Vec<Vec<(i32, f64)>> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for row in rows {
        match row.get(name) {
            Some(v) => run.push((row.year, v as f64 / scale)),
            None if !run.is_empty() => out.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        out.push(run);
    }
    out
}

/// Draw `rows` to `out_path`; `.svg` selects the SVG backend, anything else PNG.
pub fn plot_rows<P: AsRef<Path>>(
    rows: &[JoinedRow],
    columns: &[String],
    category: Category,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if rows.is_empty() || columns.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let font = chart_font();

    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    let (mut min_year, mut max_year) = (
        rows.iter()
            .map(|r| r.year)
            .min()
            .ok_or_else(|| anyhow!("no valid years"))?,
        rows.iter()
            .map(|r| r.year)
            .max()
            .ok_or_else(|| anyhow!("no valid years"))?,
    );
    if min_year == max_year {
        min_year -= 1;
        max_year += 1;
    }

    let values: Vec<i64> = rows
        .iter()
        .flat_map(|r| r.values.iter().map(|(_, v)| *v))
        .collect();
    if values.is_empty() {
        return Err(anyhow!("no numeric values to plot"));
    }
    let max_abs = values.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0) as f64;
    let (scale, scale_word) = choose_axis_scale(max_abs);

    // Population axes start at zero so relative sizes read correctly.
    let max_val = values.iter().copied().max().unwrap_or(0).max(0) as f64 / scale;
    let min_val = values.iter().copied().min().unwrap_or(0).min(0) as f64 / scale;
    let (min_val, max_val) = if (max_val - min_val).abs() < f64::EPSILON {
        (min_val - 1.0, max_val + 1.0)
    } else {
        (min_val, max_val * 1.05)
    };

    let frame = Frame {
        min_year,
        max_year,
        min_val,
        max_val,
        scale,
        scale_word,
        category,
    };

    // SVG keeps the text and leaves glyph lookup to the viewer.
    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        let labels: Vec<&str> = columns.iter().map(String::as_str).collect();
        draw_chart(root, rows, columns, &labels, &frame)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        let labels: Vec<&str> = columns
            .iter()
            .map(|c| match font {
                Some(face) => legend_label(c, face),
                None => romanize(c).unwrap_or(c),
            })
            .collect();
        draw_chart(root, rows, columns, &labels, &frame)?;
    }
    log::debug!("wrote chart {}", out_path.display());
    Ok(())
}

struct Frame {
    min_year: i32,
    max_year: i32,
    min_val: f64,
    max_val: f64,
    scale: f64,
    scale_word: &'static str,
    category: Category,
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    rows: &[JoinedRow],
    columns: &[String],
    labels: &[&str],
    frame: &Frame,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!("Population trend ({})", frame.category),
            ("sans-serif", 24),
        )
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(frame.min_year..frame.max_year, frame.min_val..frame.max_val)
        .map_err(|e| anyhow!("{:?}", e))?;

    let scaled = frame.scale > 1.0;
    let y_label_fmt = |v: &f64| {
        if scaled {
            format!("{:.1}", v)
        } else {
            ((*v).round() as i64).to_formatted_string(&Locale::en)
        }
    };
    let x_label_fmt = |y: &i32| y.to_string();
    let y_desc = if frame.scale_word.is_empty() {
        "Population".to_string()
    } else {
        format!("Population ({})", frame.scale_word)
    };

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(y_desc)
        .x_labels(((frame.max_year - frame.min_year + 1) as usize).min(12))
        .y_labels(10)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    for (idx, (name, label)) in columns.iter().zip(labels).enumerate() {
        let color = series_color(idx);
        let style = ShapeStyle {
            color,
            filled: true,
            stroke_width: 2,
        };
        for (i, run) in segments(rows, name, frame.scale).into_iter().enumerate() {
            let anno = chart
                .draw_series(LineSeries::new(run, style).point_size(2))
                .map_err(|e| anyhow!("{:?}", e))?;
            // Legend entry once per prefecture, not per segment.
            if i == 0 {
                anno.label(*label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], color));
            }
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .label_font(("sans-serif", 14))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
