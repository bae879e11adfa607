//! Single-line text drawn onto rendered frames.
//!
//! Lines are shaped with `cosmic-text` against the system font database and
//! their glyph coverage masks are blended straight into the frame.

use cosmic_text::{Attrs, Buffer, CacheKey, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use image::RgbaImage;

pub struct TextPainter {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextPainter {
    pub fn new() -> Self {
        let font_system = FontSystem::new();
        if font_system.db().faces().next().is_none() {
            log::warn!("no fonts found; frame titles and axis labels will be blank");
        }

        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    pub fn has_fonts(&self) -> bool {
        self.font_system.db().faces().next().is_some()
    }

    /// Draw `text` with its line box centered on `center`.
    pub fn draw_centered(
        &mut self,
        img: &mut RgbaImage,
        text: &str,
        font_px: f32,
        center: (f32, f32),
        color: [u8; 3],
    ) {
        let metrics = Metrics::new(font_px, font_px * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(
            &mut self.font_system,
            Some(f32::MAX),
            Some(metrics.line_height),
        );
        buffer.set_text(
            &mut self.font_system,
            text,
            &Attrs::new(),
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        // (cache key, x, y) with y measured from the top of the line box.
        let mut glyphs: Vec<(CacheKey, i32, i32)> = Vec::new();
        let (line_w, line_h) = match buffer.layout_runs().next() {
            Some(run) => {
                for glyph in run.glyphs.iter() {
                    let physical = glyph.physical((0.0, 0.0), 1.0);
                    glyphs.push((
                        physical.cache_key,
                        physical.x,
                        run.line_y.round() as i32 + physical.y,
                    ));
                }
                (run.line_w, run.line_height)
            }
            None => return,
        };

        let origin_x = (center.0 - 0.5 * line_w).round() as i32;
        let origin_y = (center.1 - 0.5 * line_h).round() as i32;

        for (key, gx, gy) in glyphs {
            let image = match self.swash_cache.get_image(&mut self.font_system, key) {
                Some(image) => image,
                None => continue,
            };
            if image.content != SwashContent::Mask {
                continue;
            }

            let left = origin_x + gx + image.placement.left;
            let top = origin_y + gy - image.placement.top;
            let w = image.placement.width as i32;
            let h = image.placement.height as i32;

            for j in 0..h {
                for i in 0..w {
                    let coverage = image.data[(j * w + i) as usize];
                    blend(img, left + i, top + j, color, coverage);
                }
            }
        }
    }
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::new()
    }
}

fn blend(img: &mut RgbaImage, x: i32, y: i32, color: [u8; 3], coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }

    let a = coverage as u32;
    let p = img.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        p.0[c] = ((color[c] as u32 * a + p.0[c] as u32 * (255 - a) + 127) / 255) as u8;
    }
    p.0[3] = p.0[3].max(coverage);
}
