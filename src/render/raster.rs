use font8x8::{UnicodeFonts, BASIC_FONTS};
use geo::{Coord, LineString, Polygon, Rect};
use image::{Rgb, RgbImage};

/// Side of one unscaled glyph cell, in pixels.
const GLYPH: u32 = 8;

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH * scale.max(1)
}

/// A rectangular region of the canvas showing a lon/lat extent at equal
/// aspect, with longitude shrunk by the cosine of the mid latitude.
#[derive(Debug, Clone, Copy)]
pub struct Panel {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    extent: Rect<f64>,
    kx: f64,
    scale: f64,
    off_x: f64,
    off_y: f64,
}

impl Panel {
    pub fn fit(left: u32, top: u32, width: u32, height: u32, extent: Rect<f64>) -> Self {
        let mid_lat = (extent.min().y + extent.max().y) / 2.0;
        let kx = mid_lat.to_radians().cos().max(0.1);
        let world_w = (extent.width() * kx).max(f64::EPSILON);
        let world_h = extent.height().max(f64::EPSILON);
        let scale = (width as f64 / world_w).min(height as f64 / world_h);

        Self {
            left,
            top,
            width,
            height,
            extent,
            kx,
            scale,
            off_x: (width as f64 - world_w * scale) / 2.0,
            off_y: (height as f64 - world_h * scale) / 2.0,
        }
    }

    pub fn project(&self, c: Coord<f64>) -> (f64, f64) {
        let x = self.left as f64 + self.off_x + (c.x - self.extent.min().x) * self.kx * self.scale;
        let y = self.top as f64 + self.off_y + (self.extent.max().y - c.y) * self.scale;
        (x, y)
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn x_range(&self) -> (i64, i64) {
        (self.left as i64, (self.left + self.width) as i64 - 1)
    }

    fn y_range(&self) -> (i64, i64) {
        (self.top as i64, (self.top + self.height) as i64 - 1)
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    }
}

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Sets a pixel, clipped to the panel.
    fn plot(&mut self, panel: &Panel, x: i64, y: i64, color: Rgb<u8>) {
        if panel.contains(x, y) && x < self.image.width() as i64 && y < self.image.height() as i64 {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Even-odd scanline fill over the exterior and interior rings.
    pub fn fill_polygon(&mut self, panel: &Panel, polygon: &Polygon<f64>, color: Rgb<u8>) {
        let rings: Vec<Vec<(f64, f64)>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| ring.coords().map(|c| panel.project(*c)).collect())
            .collect();

        let (min_y, max_y) = rings
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        if !min_y.is_finite() {
            return;
        }

        let (py0, py1) = panel.y_range();
        let (px0, px1) = panel.x_range();
        let row_start = (min_y.floor() as i64).max(py0);
        let row_end = (max_y.ceil() as i64).min(py1);

        let mut crossings = vec![];
        for row in row_start..=row_end {
            let sy = row as f64 + 0.5;
            crossings.clear();
            for ring in rings.iter() {
                for edge in ring.windows(2) {
                    let (a, b) = (edge[0], edge[1]);
                    if (a.1 <= sy) != (b.1 <= sy) {
                        crossings.push(a.0 + (sy - a.1) * (b.0 - a.0) / (b.1 - a.1));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let start = ((span[0] - 0.5).ceil() as i64).max(px0);
                let end = ((span[1] - 0.5).floor() as i64).min(px1);
                for col in start..=end {
                    self.plot(panel, col, row, color);
                }
            }
        }
    }

    pub fn stroke_polygon(
        &mut self,
        panel: &Panel,
        polygon: &Polygon<f64>,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        self.stroke_line_string(panel, polygon.exterior(), color, thickness);
        for interior in polygon.interiors() {
            self.stroke_line_string(panel, interior, color, thickness);
        }
    }

    pub fn stroke_line_string(
        &mut self,
        panel: &Panel,
        line: &LineString<f64>,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        for segment in line.lines() {
            let a = panel.project(segment.start);
            let b = panel.project(segment.end);
            self.draw_line(panel, a, b, color, thickness);
        }
    }

    /// Bresenham line with a square brush.
    fn draw_line(
        &mut self,
        panel: &Panel,
        a: (f64, f64),
        b: (f64, f64),
        color: Rgb<u8>,
        thickness: u32,
    ) {
        let (px0, px1) = panel.x_range();
        let (py0, py1) = panel.y_range();
        // Both ends beyond the same panel edge: nothing visible.
        if (a.0 < px0 as f64 && b.0 < px0 as f64)
            || (a.0 > px1 as f64 && b.0 > px1 as f64)
            || (a.1 < py0 as f64 && b.1 < py0 as f64)
            || (a.1 > py1 as f64 && b.1 > py1 as f64)
        {
            return;
        }

        let (mut x, mut y) = (a.0.floor() as i64, a.1.floor() as i64);
        let (x1, y1) = (b.0.floor() as i64, b.1.floor() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let half = thickness as i64 / 2;
        let reach = thickness.max(1) as i64 - half;
        loop {
            for bx in -half..reach {
                for by in -half..reach {
                    self.plot(panel, x + bx, y + by, color);
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draws `text` in the 8x8 bitmap font with its top-left corner at `(x, y)`,
    /// each font pixel blown up to a `scale`-sized square. Characters without
    /// a glyph leave a blank cell.
    pub fn draw_text(
        &mut self,
        panel: &Panel,
        x: i64,
        y: i64,
        text: &str,
        color: Rgb<u8>,
        scale: u32,
    ) {
        let scale = scale.max(1) as i64;
        let cell = GLYPH as i64 * scale;
        for (i, c) in text.chars().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(c) else {
                continue;
            };
            let gx = x + i as i64 * cell;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH as i64 {
                    // Bit 0 is the leftmost pixel.
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.plot(panel, gx + col * scale + dx, y + row as i64 * scale + dy, color);
                        }
                    }
                }
            }
        }
    }

    pub fn fill_disc(&mut self, panel: &Panel, center: Coord<f64>, radius: u32, color: Rgb<u8>) {
        let (cx, cy) = panel.project(center);
        let (cx, cy) = (cx.floor() as i64, cy.floor() as i64);
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.plot(panel, cx + dx, cy + dy, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn equator_panel() -> Panel {
        let extent = Rect::new(coord! { x: 0.0, y: -5.0 }, coord! { x: 10.0, y: 5.0 });
        Panel::fit(0, 0, 100, 100, extent)
    }

    #[test]
    fn test_project_corners() {
        let panel = equator_panel();
        let (x, y) = panel.project(coord! { x: 0.0, y: 5.0 });
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        let (x, y) = panel.project(coord! { x: 10.0, y: -5.0 });
        assert!((x - 100.0).abs() < 0.1 && (y - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_fill_respects_holes() {
        let panel = equator_panel();
        let shape = polygon!(
            exterior: [
                (x: 1.0, y: -4.0),
                (x: 9.0, y: -4.0),
                (x: 9.0, y: 4.0),
                (x: 1.0, y: 4.0),
            ],
            interiors: [[
                (x: 4.0, y: -1.0),
                (x: 6.0, y: -1.0),
                (x: 6.0, y: 1.0),
                (x: 4.0, y: 1.0),
            ]],
        );
        let mut canvas = Canvas::new(100, 100, WHITE);
        canvas.fill_polygon(&panel, &shape, RED);
        let image = canvas.into_image();

        assert_eq!(*image.get_pixel(20, 20), RED);
        assert_eq!(*image.get_pixel(50, 50), WHITE);
        assert_eq!(*image.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn test_stroke_draws_boundary_only() {
        let panel = equator_panel();
        let shape = polygon![
            (x: 2.0, y: -3.0),
            (x: 8.0, y: -3.0),
            (x: 8.0, y: 3.0),
            (x: 2.0, y: 3.0),
        ];
        let mut canvas = Canvas::new(100, 100, WHITE);
        canvas.stroke_polygon(&panel, &shape, RED, 1);
        let image = canvas.into_image();

        let (x, y) = panel.project(coord! { x: 2.0, y: 0.0 });
        assert_eq!(*image.get_pixel(x.floor() as u32, y.floor() as u32), RED);
        assert_eq!(*image.get_pixel(50, 50), WHITE);
    }

    #[test]
    fn test_drawing_is_clipped_to_panel() {
        let extent = Rect::new(coord! { x: 0.0, y: -5.0 }, coord! { x: 10.0, y: 5.0 });
        let right = Panel::fit(50, 0, 50, 50, extent);
        let mut canvas = Canvas::new(100, 50, WHITE);
        canvas.fill_disc(&right, coord! { x: 0.0, y: 0.0 }, 10, RED);
        let image = canvas.into_image();

        assert_eq!(*image.get_pixel(49, 25), WHITE);
        assert_eq!(*image.get_pixel(51, 25), RED);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("07340300", 1), 64);
        assert_eq!(text_width("AR", 3), 48);
        assert_eq!(text_width("", 2), 0);
    }

    #[test]
    fn test_draw_text() {
        let panel = equator_panel();
        let mut canvas = Canvas::new(100, 100, WHITE);
        canvas.draw_text(&panel, 10, 10, "H", RED, 2);
        let image = canvas.into_image();

        let lit = (10..26)
            .flat_map(|x| (10..26).map(move |y| (x, y)))
            .filter(|&(x, y)| *image.get_pixel(x, y) == RED)
            .count();
        assert!(lit > 0);
        let outside = image
            .enumerate_pixels()
            .filter(|(x, y, p)| **p == RED && !((10..26).contains(x) && (10..26).contains(y)))
            .count();
        assert_eq!(outside, 0);
    }

    #[test]
    fn test_text_is_clipped_to_panel() {
        let extent = Rect::new(coord! { x: 0.0, y: -5.0 }, coord! { x: 10.0, y: 5.0 });
        let left = Panel::fit(0, 0, 50, 50, extent);
        let mut canvas = Canvas::new(100, 50, WHITE);
        canvas.draw_text(&left, 30, 10, "MMMMMMMM", RED, 1);
        let image = canvas.into_image();

        assert!((30..50).any(|x| (10..18).any(|y| *image.get_pixel(x, y) == RED)));
        assert!(image
            .enumerate_pixels()
            .all(|(x, _, p)| x < 50 || *p == WHITE));
    }
}
