//! Raster target the renderer draws into.
//!
//! [`Surface`] is the seam between the rendering cache and whatever presents
//! the frame. [`RasterSurface`] is the software implementation used by the
//! command line tool: an `RgbaImage` with source-over blending.

use image::{Rgba, RgbaImage};

pub type Color = [u8; 4];

pub const TRANSPARENT: Color = [0, 0, 0, 0];

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of an image, anchored at the origin.
    pub fn of_image(image: &RgbaImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    #[inline]
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x as i64) < other.right()
            && (other.x as i64) < self.right()
            && (self.y as i64) < other.bottom()
            && (other.y as i64) < self.bottom()
    }
}

/// A text label queued for the host's font renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    /// Horizontal centre of the text.
    pub x: i32,
    /// Baseline.
    pub y: i32,
    pub color: Color,
}

pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Replaces every pixel with `color`.
    fn clear(&mut self, color: Color);

    /// Copies `src_rect` of `src` to `(dst_x, dst_y)`, blending over what is
    /// already there.
    fn blit(&mut self, src: &RgbaImage, src_rect: Rect, dst_x: i32, dst_y: i32);

    fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color);

    fn stroke_polyline(&mut self, points: &[(i32, i32)], closed: bool, width: u32, color: Color);

    fn draw_label(&mut self, text: &str, x: i32, y: i32, color: Color);

    fn bounds(&self) -> Rect {
        let (width, height) = self.size();
        Rect::new(0, 0, width, height)
    }
}

/// Straight-alpha source-over.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Color) {
    let sa = src[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        *dst = Rgba(src);
        return;
    }

    let da = dst[3] as u32;
    let inv = 255 - sa;
    let out_a = sa + da * inv / 255;
    if out_a == 0 {
        *dst = Rgba(TRANSPARENT);
        return;
    }
    for c in 0..3 {
        let blended = (src[c] as u32 * sa + dst[c] as u32 * da * inv / 255) / out_a;
        dst[c] = blended.min(255) as u8;
    }
    dst[3] = out_a.min(255) as u8;
}

/// Fills `rect` of `image` with `color`, replacing the pixels, clipped.
pub fn fill_rect(image: &mut RgbaImage, rect: Rect, color: Color) {
    let x0 = rect.x.max(0) as i64;
    let y0 = rect.y.max(0) as i64;
    let x1 = rect.right().min(image.width() as i64);
    let y1 = rect.bottom().min(image.height() as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x as u32, y as u32, Rgba(color));
        }
    }
}

/// Clips the segment `from`..`to` to the box `min`..=`max` (Liang-Barsky).
fn clip_segment(
    from: (i64, i64),
    to: (i64, i64),
    min: (i64, i64),
    max: (i64, i64),
) -> Option<((i64, i64), (i64, i64))> {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, x0 - min.0 as f64),
        (dx, max.0 as f64 - x0),
        (-dy, y0 - min.1 as f64),
        (dy, max.1 as f64 - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
    Some((at(t0), at(t1)))
}

#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    labels: Vec<Label>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            labels: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        blend_pixel(self.image.get_pixel_mut(x as u32, y as u32), color);
    }

    fn plot_square(&mut self, x: i64, y: i64, width: u32, color: Color) {
        let half = (width / 2) as i64;
        let side = width.max(1) as i64;
        for dy in 0..side {
            for dx in 0..side {
                self.plot(x - half + dx, y - half + dy, color);
            }
        }
    }

    fn line(&mut self, from: (i32, i32), to: (i32, i32), width: u32, color: Color) {
        // Only the part of the segment near the image is walked.
        let margin = width as i64 + 1;
        let min = (-margin, -margin);
        let max = (
            self.image.width() as i64 + margin,
            self.image.height() as i64 + margin,
        );
        let from = (from.0 as i64, from.1 as i64);
        let to = (to.0 as i64, to.1 as i64);
        let Some((from, to)) = clip_segment(from, to, min, max) else {
            return;
        };

        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot_square(x, y, width, color);
            if x == to.0 && y == to.1 {
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
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba(color);
        }
        self.labels.clear();
    }

    fn blit(&mut self, src: &RgbaImage, src_rect: Rect, dst_x: i32, dst_y: i32) {
        let (src_w, src_h) = (src.width() as i64, src.height() as i64);
        let (dst_w, dst_h) = (self.image.width() as i64, self.image.height() as i64);
        let (dst_x, dst_y) = (dst_x as i64, dst_y as i64);

        // rows and columns that land inside both images
        let rows = (-dst_y).max(-(src_rect.y as i64)).max(0)
            ..(src_rect.height as i64).min(dst_h - dst_y).min(src_h - src_rect.y as i64);
        let cols = (-dst_x).max(-(src_rect.x as i64)).max(0)
            ..(src_rect.width as i64).min(dst_w - dst_x).min(src_w - src_rect.x as i64);

        for sy in rows {
            let from_y = src_rect.y as i64 + sy;
            let to_y = dst_y + sy;
            for sx in cols.clone() {
                let from_x = src_rect.x as i64 + sx;
                let to_x = dst_x + sx;
                let color = src.get_pixel(from_x as u32, from_y as u32).0;
                blend_pixel(self.image.get_pixel_mut(to_x as u32, to_y as u32), color);
            }
        }
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let bounds = Rect::new(
            cx.saturating_sub_unsigned(radius),
            cy.saturating_sub_unsigned(radius),
            radius.saturating_mul(2).saturating_add(1),
            radius.saturating_mul(2).saturating_add(1),
        );
        if !bounds.intersects(&self.bounds()) {
            return;
        }

        let (cx, cy) = (cx as i64, cy as i64);
        let r = radius as i64;
        let r2 = r * r;
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        for y in (cy - r).max(0)..=(cy + r).min(h - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(w - 1) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r2 {
                    self.plot(x, y, color);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[(i32, i32)], closed: bool, width: u32, color: Color) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], width, color);
        }
        if closed && points.len() > 2 {
            if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                self.line(last, first, width, color);
            }
        }
    }

    fn draw_label(&mut self, text: &str, x: i32, y: i32, color: Color) {
        self.labels.push(Label {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}
