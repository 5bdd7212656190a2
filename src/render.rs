//! Two-panel basin map: continental context and zoomed detail
mod raster;
pub use raster::{text_width, Canvas, Panel};

use crate::basin::Basins;
use crate::usgs::states::State;
use anyhow::{anyhow, Result};
use geo::{coord, BoundingRect, MultiPolygon, Rect};
use image::{Rgb, RgbImage};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const STATE_EDGE: Rgb<u8> = Rgb([0, 0, 0]);
const CONTEXT_HUC12_EDGE: Rgb<u8> = Rgb([255, 255, 0]);
const CONTEXT_BASIN: Rgb<u8> = Rgb([255, 0, 0]);
const DETAIL_HUC12_EDGE: Rgb<u8> = Rgb([128, 128, 128]);
const DETAIL_BASIN: Rgb<u8> = Rgb([0, 0, 255]);
const SITE_MARKER: Rgb<u8> = Rgb([255, 0, 0]);
const TITLE: Rgb<u8> = Rgb([0, 0, 0]);

fn union(a: Option<Rect<f64>>, b: Option<Rect<f64>>) -> Option<Rect<f64>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Rect::new(
            coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        )),
        (a, b) => a.or(b),
    }
}

/// Grows `rect` by `fraction` of its size on every side, at least 0.01°.
fn pad(rect: Rect<f64>, fraction: f64) -> Rect<f64> {
    let dx = (rect.width() * fraction).max(0.01);
    let dy = (rect.height() * fraction).max(0.01);
    Rect::new(
        coord! { x: rect.min().x - dx, y: rect.min().y - dy },
        coord! { x: rect.max().x + dx, y: rect.max().y + dy },
    )
}

fn extent<'a>(geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Option<Rect<f64>> {
    geometries
        .into_iter()
        .fold(None, |acc, g| union(acc, g.bounding_rect()))
}

/// Left panel covers the states (or the basin when there are none); right
/// panel covers the basin and its neighbours.
pub fn basin_panels(
    basins: &Basins,
    states: &[State],
    width: u32,
    height: u32,
) -> Result<(Panel, Panel)> {
    if width < 2 || height < 1 {
        return Err(anyhow!("Map size {}x{} is too small", width, height));
    }
    let detail = extent(
        std::iter::once(&basins.basin.geometry).chain(basins.neighbors.iter().map(|h| &h.geometry)),
    )
    .ok_or(anyhow!("Nothing to draw"))?;
    let context = extent(states.iter().map(|s| &s.geometry)).unwrap_or(detail);

    let half = width / 2;
    Ok((
        Panel::fit(0, 0, half, height, pad(context, 0.02)),
        Panel::fit(half, 0, width - half, height, pad(detail, 0.05)),
    ))
}

pub fn render_basin_map(
    basins: &Basins,
    states: &[State],
    width: u32,
    height: u32,
) -> Result<RgbImage> {
    let (context, detail) = basin_panels(basins, states, width, height)?;
    let thickness = (width / 1000).max(1);
    let mut canvas = Canvas::new(width, height, BACKGROUND);

    for state in states {
        for polygon in state.geometry.iter() {
            canvas.stroke_polygon(&context, polygon, STATE_EDGE, thickness);
        }
    }
    for huc in basins.neighbors.iter() {
        for polygon in huc.geometry.iter() {
            canvas.stroke_polygon(&context, polygon, CONTEXT_HUC12_EDGE, thickness);
            canvas.stroke_polygon(&detail, polygon, DETAIL_HUC12_EDGE, thickness);
        }
    }
    for polygon in basins.basin.geometry.iter() {
        canvas.fill_polygon(&context, polygon, CONTEXT_BASIN);
        canvas.fill_polygon(&detail, polygon, DETAIL_BASIN);
    }

    let site = coord! { x: basins.info.dec_long_va, y: basins.info.dec_lat_va };
    let radius = (width / 200).max(3);
    canvas.fill_disc(&detail, site, radius, SITE_MARKER);

    let text_scale = (height / 250).max(1);
    let (sx, sy) = detail.project(site);
    canvas.draw_text(
        &detail,
        sx.floor() as i64 + radius as i64 + 2,
        sy.floor() as i64 - 4 * text_scale as i64,
        &basins.info.site_no,
        SITE_MARKER,
        text_scale,
    );

    // Centred over the detail panel; titles wider than the panel start at its
    // left margin and are cut at the right edge.
    let title = &basins.info.station_nm;
    let margin = 2 * text_scale as i64;
    let spare = detail.width() as i64 - text_width(title, text_scale) as i64;
    canvas.draw_text(
        &detail,
        detail.left() as i64 + (spare / 2).max(margin),
        detail.top() as i64 + margin,
        title,
        TITLE,
        text_scale,
    );

    Ok(canvas.into_image())
}
