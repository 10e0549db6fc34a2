use crate::color::Rgb;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

// ============================================================================
// RASTER
// ============================================================================

// Each terminal cell shows two raster pixels: fg paints the top one, bg the
// bottom one.

const HALF_BLOCK: &str = "\u{2580}";

/// One stop of a one-dimensional gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
    pub alpha: f32,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgb, alpha: f32) -> Self {
        Self {
            offset,
            color,
            alpha,
        }
    }
}

/// Samples sorted `stops` at `t`, clamping outside the first and last stop.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> (Rgb, f32) {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (Rgb::BLACK, 0.0),
    };
    if t <= first.offset {
        return (first.color, first.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let k = (t - a.offset) / span;
            return (a.color.lerp(b.color, k), a.alpha + (b.alpha - a.alpha) * k);
        }
    }
    (last.color, last.alpha)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u16,
    height: u16,
    pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resizes and clears to black.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgb::BLACK; width as usize * height as usize];
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Fills with a gradient running from the top-left to the bottom-right
    /// corner. Stop alphas are ignored.
    pub fn fill_diagonal(&mut self, stops: &[GradientStop]) {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        let len_sq = w * w + h * h;
        for y in 0..self.height {
            for x in 0..self.width {
                let t = (x as f32 * w + y as f32 * h) / len_sq;
                let (color, _) = sample_gradient(stops, t);
                if let Some(i) = self.index(x as i32, y as i32) {
                    self.pixels[i] = color;
                }
            }
        }
    }

    /// Blends `color` over the pixel at `(x, y)`; out-of-range writes are
    /// dropped.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.over(self.pixels[i], alpha.min(1.0));
        }
    }

    /// A solid disc. Radii under one pixel still cover the center pixel.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let r = radius.max(0.5);
        let (x0, x1) = ((cx - r).floor() as i32, (cx + r).ceil() as i32);
        let (y0, y1) = ((cy - r).floor() as i32, (cy + r).ceil() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    /// A radial gradient disc described by `stops` over `0..=radius`.
    pub fn fill_radial(&mut self, cx: f32, cy: f32, radius: f32, stops: &[GradientStop]) {
        if radius <= 0.0 {
            return;
        }
        let (x0, x1) = ((cx - radius).floor() as i32, (cx + radius).ceil() as i32);
        let (y0, y1) = ((cy - radius).floor() as i32, (cy + radius).ceil() as i32);
        for y in y0.max(0)..=y1.min(self.height as i32 - 1) {
            for x in x0.max(0)..=x1.min(self.width as i32 - 1) {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d > radius {
                    continue;
                }
                let (tint, alpha) = sample_gradient(stops, d / radius);
                self.blend(x, y, tint, alpha);
            }
        }
    }

    /// Horizontal and vertical spikes of `length` pixels through a point.
    pub fn cross(&mut self, cx: f32, cy: f32, length: f32, color: Rgb, alpha: f32) {
        let (x, y) = (cx.floor() as i32, cy.floor() as i32);
        let n = length.round() as i32;
        for d in 1..=n {
            let fade = alpha * (1.0 - (d - 1) as f32 / n as f32);
            self.blend(x - d, y, color, fade);
            self.blend(x + d, y, color, fade);
            self.blend(x, y - d, color, fade);
            self.blend(x, y + d, color, fade);
        }
    }
}

/// Renders a [`Raster`] with half blocks, clipped to the area.
pub struct RasterView<'a> {
    raster: &'a Raster,
}

impl<'a> RasterView<'a> {
    pub fn new(raster: &'a Raster) -> Self {
        Self { raster }
    }
}

impl Widget for RasterView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let top = self.raster.pixel(col as i32, row as i32 * 2);
                let bottom = self.raster.pixel(col as i32, row as i32 * 2 + 1);
                let (Some(top), Some(bottom)) = (top, bottom) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(top.to_color())
                        .set_bg(bottom.to_color());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_blend_out_of_range_is_dropped() {
        let mut raster = Raster::new(4, 4);
        raster.blend(-1, 0, Rgb::WHITE, 1.0);
        raster.blend(4, 4, Rgb::WHITE, 1.0);
        assert!((0..4).all(|y| (0..4).all(|x| raster.pixel(x, y) == Some(Rgb::BLACK))));
        raster.blend(1, 2, Rgb::WHITE, 0.5);
        assert_eq!(raster.pixel(1, 2), Some(Rgb::new(127.5, 127.5, 127.5)));
    }

    #[test]
    fn test_sample_gradient_interpolates_and_clamps() {
        let stops = [
            GradientStop::new(0.0, Rgb::BLACK, 0.0),
            GradientStop::new(1.0, Rgb::WHITE, 1.0),
        ];
        let (color, alpha) = sample_gradient(&stops, 0.5);
        assert_eq!(color, Rgb::new(127.5, 127.5, 127.5));
        assert_eq!(alpha, 0.5);
        assert_eq!(sample_gradient(&stops, 2.0), (Rgb::WHITE, 1.0));
        assert_eq!(sample_gradient(&[], 0.3), (Rgb::BLACK, 0.0));
    }

    #[test]
    fn test_diagonal_fill_runs_corner_to_corner() {
        let mut raster = Raster::new(10, 10);
        raster.fill_diagonal(&[
            GradientStop::new(0.0, Rgb::BLACK, 1.0),
            GradientStop::new(1.0, Rgb::WHITE, 1.0),
        ]);
        assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));
        let far = raster.pixel(9, 9).unwrap();
        assert!(far.r > 200.0);
    }

    #[test]
    fn test_view_uses_half_blocks() {
        let mut raster = Raster::new(2, 2);
        raster.blend(0, 0, Rgb::WHITE, 1.0);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        RasterView::new(&raster).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), HALF_BLOCK);
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
    }
}
