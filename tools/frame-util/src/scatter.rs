use anyhow::{anyhow, ensure, Result};
use image::{Rgba, RgbaImage};
use nbody_anim::{ticks, Limits, Viewport};
use ndarray::ArrayView1;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::text::TextPainter;

const DPI: f32 = 100.0;
const TICK_LEN: f32 = 4.0;
const TICK_TARGET: usize = 5;

/// Radius in pixels of a marker whose area is `area` square points.
pub fn marker_radius(area: f32, dpi: f32) -> f32 {
    0.5 * area.sqrt() * dpi / 72.0
}

#[derive(Debug, Clone, Copy)]
pub struct ScatterStyle {
    pub width: u32,
    pub height: u32,
    pub padding: f32,
    pub font_px: f32,
    pub point_radius: f32,
    pub background: Color,
    pub point_color: Color,
    pub axis_color: Color,
}

impl ScatterStyle {
    /// Square canvas of `size` pixels with a tenth of it as padding.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            padding: 0.1 * size as f32,
            font_px: (0.025 * size as f32).max(10.0),
            ..Self::default()
        }
    }
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            padding: 60.0,
            font_px: 15.0,
            point_radius: marker_radius(5.0, DPI),
            background: Color::WHITE,
            point_color: Color::from_rgba8(0x1f, 0x77, 0xb4, 0xff),
            axis_color: Color::BLACK,
        }
    }
}

/// Title drawn above the axes for frame `step` (0-based) of `num_steps`.
pub fn frame_title(step: usize, num_steps: usize) -> String {
    format!("N-body simulation (step {}/{})", step + 1, num_steps)
}

/// A fixed set of axes onto which each frame's points are drawn.
pub struct ScatterPlot {
    style: ScatterStyle,
    viewport: Viewport,
    text: TextPainter,
}

impl ScatterPlot {
    pub fn new(style: ScatterStyle, limits: Limits) -> Self {
        let viewport = Viewport::new(limits, style.width, style.height, style.padding);
        Self {
            style,
            viewport,
            text: TextPainter::new(),
        }
    }

    /// Whether any font was found for the title and axis labels.
    pub fn has_fonts(&self) -> bool {
        self.text.has_fonts()
    }

    pub fn style(&self) -> &ScatterStyle {
        &self.style
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Draw the axes, labels, the title for `step` of `num_steps` and every
    /// point inside the limits, replacing whatever the previous frame showed.
    pub fn render(
        &mut self,
        xs: ArrayView1<f32>,
        ys: ArrayView1<f32>,
        step: usize,
        num_steps: usize,
    ) -> Result<RgbaImage> {
        ensure!(
            xs.len() == ys.len(),
            "x and y rows differ in length ({} vs {})",
            xs.len(),
            ys.len()
        );

        let (w, h) = (self.style.width, self.style.height);
        let mut pixmap =
            Pixmap::new(w, h).ok_or_else(|| anyhow!("invalid canvas size {}x{}", w, h))?;
        pixmap.fill(self.style.background);

        self.draw_axes(&mut pixmap)?;

        let mut pb = PathBuilder::new();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            if !self.viewport.contains(x, y) {
                continue;
            }
            let p = self.viewport.to_pixel(x, y);
            pb.push_circle(p.x, p.y, self.style.point_radius);
        }

        // `finish` yields nothing when no point is visible.
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(self.style.point_color);
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        let mut img = RgbaImage::new(w, h);
        for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        self.draw_labels(&mut img, step, num_steps);

        Ok(img)
    }

    fn draw_labels(&mut self, img: &mut RgbaImage, step: usize, num_steps: usize) {
        let r = self.viewport.plot_rect();
        let font_px = self.style.font_px;
        let c = self.style.axis_color.to_color_u8();
        let color = [c.red(), c.green(), c.blue()];

        let center_x = r.left + 0.5 * r.width;
        let bottom = r.top + r.height;

        let title = frame_title(step, num_steps);
        self.text
            .draw_centered(img, &title, 1.2 * font_px, (center_x, 0.5 * r.top), color);

        let below = bottom + TICK_LEN + 0.5 * (self.style.height as f32 - bottom - TICK_LEN);
        self.text
            .draw_centered(img, "x", font_px, (center_x, below), color);

        let left_of = 0.5 * (r.left - TICK_LEN);
        self.text
            .draw_centered(img, "y", font_px, (left_of, r.top + 0.5 * r.height), color);
    }

    fn draw_axes(&self, pixmap: &mut Pixmap) -> Result<()> {
        let r = self.viewport.plot_rect();
        let rect = Rect::from_xywh(r.left, r.top, r.width, r.height)
            .ok_or_else(|| anyhow!("degenerate plot area {:?}", r))?;

        let mut pb = PathBuilder::new();
        pb.push_rect(rect);

        let limits = self.viewport.limits();
        let bottom = r.top + r.height;
        for x in ticks(limits.x.0, limits.x.1, TICK_TARGET) {
            let px = self.viewport.to_pixel(x, limits.y.0).x;
            pb.move_to(px, bottom);
            pb.line_to(px, bottom + TICK_LEN);
        }
        for y in ticks(limits.y.0, limits.y.1, TICK_TARGET) {
            let py = self.viewport.to_pixel(limits.x.0, y).y;
            pb.move_to(r.left, py);
            pb.line_to(r.left - TICK_LEN, py);
        }

        let path = pb.finish().ok_or_else(|| anyhow!("empty axes path"))?;

        let mut paint = Paint::default();
        paint.set_color(self.style.axis_color);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

        Ok(())
    }
}
