//! Axis limits and the mapping from data space to pixels.

use crate::trajectory::Bounds;
use cgmath::{vec2, Vector2};

/// Smallest span a limit range is allowed to collapse to.
const MIN_SPAN: f32 = 1.0;

/// Data-space extent of the plot on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

impl Limits {
    /// Degenerate or inverted ranges are widened to a unit span around their center.
    pub fn new(x: (f32, f32), y: (f32, f32)) -> Self {
        Self {
            x: widen(x),
            y: widen(y),
        }
    }

    /// Square box `[-half_extent, half_extent]` on both axes.
    pub fn fixed(half_extent: f32) -> Self {
        let h = half_extent.abs();
        Self::new((-h, h), (-h, h))
    }

    /// Data bounds padded by `margin` of their span on each side.
    pub fn fit(bounds: &Bounds, margin: f32) -> Self {
        let pad = |(lo, hi): (f32, f32)| {
            let m = margin * (hi - lo + 1e-6);
            (lo - m, hi + m)
        };
        Self::new(pad(bounds.x), pad(bounds.y))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }

    pub fn span(&self) -> Vector2<f32> {
        vec2(self.x.1 - self.x.0, self.y.1 - self.y.0)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::fixed(50.0)
    }
}

fn widen((lo, hi): (f32, f32)) -> (f32, f32) {
    if hi - lo > 0.0 {
        (lo, hi)
    } else {
        let c = 0.5 * (lo + hi);
        (c - 0.5 * MIN_SPAN, c + 0.5 * MIN_SPAN)
    }
}

/// Pixel rectangle of the axes box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Equal-aspect placement of `Limits` inside a `width` x `height` canvas.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    limits: Limits,
    scale: f32,
    rect: PlotRect,
}

impl Viewport {
    pub fn new(limits: Limits, width: u32, height: u32, padding: f32) -> Self {
        let avail = vec2(
            (width as f32 - 2.0 * padding).max(1.0),
            (height as f32 - 2.0 * padding).max(1.0),
        );
        let span = limits.span();

        // One data unit covers the same number of pixels on both axes.
        let scale = (avail.x / span.x).min(avail.y / span.y);
        let box_size = span * scale;

        let rect = PlotRect {
            left: 0.5 * (width as f32 - box_size.x),
            top: 0.5 * (height as f32 - box_size.y),
            width: box_size.x,
            height: box_size.y,
        };

        Self {
            limits,
            scale,
            rect,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Pixels per data unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn plot_rect(&self) -> PlotRect {
        self.rect
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.limits.contains(x, y)
    }

    /// Data `y` grows upward, pixel `y` grows downward.
    pub fn to_pixel(&self, x: f32, y: f32) -> Vector2<f32> {
        vec2(
            self.rect.left + (x - self.limits.x.0) * self.scale,
            self.rect.top + (self.limits.y.1 - y) * self.scale,
        )
    }
}

/// Evenly spaced "nice" values (1, 2 or 5 times a power of ten) within `[min, max]`.
pub fn ticks(min: f32, max: f32, target: usize) -> Vec<f32> {
    let span = max - min;
    if !(span > 0.0) || target == 0 || !span.is_finite() {
        return Vec::new();
    }

    let raw = span / target as f32;
    let mag = 10f32.powf(raw.log10().floor());
    let norm = raw / mag;
    let step = mag
        * if norm <= 1.0 {
            1.0
        } else if norm <= 2.0 {
            2.0
        } else if norm <= 5.0 {
            5.0
        } else {
            10.0
        };

    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-4).floor() as i64;

    (first..=last)
        .map(|k| {
            let v = k as f32 * step;
            if v.abs() < step * 1e-6 {
                0.0
            } else {
                v
            }
        })
        .collect()
}
