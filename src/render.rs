use rayon::prelude::*;

use crate::field::Field;
use crate::label::Labeling;
use crate::rng::splitmix32;
use crate::sweep::SweepTable;
use crate::theory::{INV_PHI, theory};

const LAND: [u8; 4] = [70, 130, 62, 255];
const WATER: [u8; 4] = [32, 55, 92, 255];
const UNLABELED: [u8; 4] = [12, 12, 20, 255];

// Chart palette
const BG: [u8; 4] = [8, 8, 16, 255];
const AXIS: [u8; 4] = [90, 90, 100, 255];
const MARKER: [u8; 4] = [210, 200, 160, 255];
const THEORY: [u8; 4] = [80, 145, 245, 255];
const SIMULATED: [u8; 4] = [240, 80, 45, 255];

/// Land/water image, one pixel per cell.
pub fn render_field(field: &Field) -> Vec<u8> {
    let w = field.w;
    let mut rgba = vec![0u8; field.len() * 4];

    rgba.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let color = if field.get(x, y) { LAND } else { WATER };
                row[x * 4..x * 4 + 4].copy_from_slice(&color);
            }
        });

    rgba
}

/// Stable hashed color for component `label`.
#[inline]
fn label_color(label: u32, salt: u32) -> [u8; 4] {
    let h = splitmix32(label.wrapping_mul(7).wrapping_add(salt));
    [
        (h & 0xFF) as u8 | 60,
        ((h >> 8) & 0xFF) as u8 | 60,
        ((h >> 16) & 0xFF) as u8 | 60,
        255,
    ]
}

/// One color per component; cells outside the pass stay dark.
pub fn render_labels(labeling: &Labeling, palette_seed: u32) -> Vec<u8> {
    let labels = &labeling.labels;
    let w = labels.w;
    let salt = palette_seed ^ if labeling.target { 0x1000_0000 } else { 0 };
    let mut rgba = vec![0u8; labels.len() * 4];

    rgba.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let l = labels.get(x, y);
                let color = if l == 0 { UNLABELED } else { label_color(l, salt) };
                row[x * 4..x * 4 + 4].copy_from_slice(&color);
            }
        });

    rgba
}

/// Tiny RGBA canvas for the sweep chart.
struct Canvas {
    rgba: Vec<u8>,
    w: usize,
    h: usize,
}

impl Canvas {
    fn new(w: usize, h: usize, bg: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; w * h * 4];
        for px in rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }
        Self { rgba, w, h }
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return;
        }
        let i = (y as usize * self.w + x as usize) * 4;
        self.rgba[i..i + 4].copy_from_slice(&color);
    }

    /// Bresenham line.
    fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.put(x, y, color);
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

    fn dot(&mut self, x: i64, y: i64, r: i64, color: [u8; 4]) {
        for oy in -r..=r {
            for ox in -r..=r {
                self.put(x + ox, y + oy, color);
            }
        }
    }
}

/// Chart of simulated (island − pool) density against the closed form.
///
/// x spans p in [0, 1]; y spans the data range with a margin. The dashed
/// vertical marker sits at p = 1/φ.
pub fn render_sweep(table: &SweepTable, w: usize, h: usize) -> Vec<u8> {
    let mut c = Canvas::new(w, h, BG);
    if w < 4 || h < 4 {
        return c.rgba;
    }
    let margin = (w.min(h) / 16).max(2) as f64;

    let samples: Vec<(f64, f64)> = (0..=200)
        .map(|i| {
            let p = i as f64 / 200.0;
            (p, theory(p))
        })
        .collect();

    let (mut lo, mut hi) = (0.0f64, 0.0f64);
    for v in samples
        .iter()
        .map(|s| s.1)
        .chain(table.results.iter().map(|r| r.difference()))
    {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let pad = ((hi - lo) * 0.1).max(1e-6);
    let (lo, hi) = (lo - pad, hi + pad);

    let px = |p: f64| (margin + p * (w as f64 - 2.0 * margin)).round() as i64;
    let py = |v: f64| (margin + (hi - v) / (hi - lo) * (h as f64 - 2.0 * margin)).round() as i64;

    // zero axis and p-range frame
    c.line(px(0.0), py(0.0), px(1.0), py(0.0), AXIS);
    c.line(px(0.0), py(lo), px(0.0), py(hi), AXIS);

    let mx = px(INV_PHI);
    let (top, bottom) = (py(hi), py(lo));
    let mut y = top;
    while y < bottom {
        c.line(mx, y, mx, (y + 3).min(bottom), MARKER);
        y += 7;
    }

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        c.line(px(a.0), py(a.1), px(b.0), py(b.1), THEORY);
    }

    let r = (w.min(h) / 160).max(1) as i64;
    for row in &table.results {
        c.dot(px(row.p), py(row.difference()), r, SIMULATED);
    }

    c.rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::label;
    use crate::sweep::SweepRow;

    #[test]
    fn field_pixels_follow_cells() {
        let mut f = Field::new(3, 2);
        f.set(2, 1, true);
        let rgba = render_field(&f);
        assert_eq!(rgba.len(), 3 * 2 * 4);
        assert_eq!(&rgba[0..4], &WATER);
        assert_eq!(&rgba[20..24], &LAND);
    }

    #[test]
    fn same_component_same_color() {
        let mut f = Field::new(5, 1);
        f.set(0, 0, true);
        f.set(4, 0, true);
        f.set(2, 0, true);
        let l = label(&f, true);
        let rgba = render_labels(&l, 9);
        assert_eq!(&rgba[0..4], &rgba[16..20]);
        assert_eq!(&rgba[4..8], &UNLABELED);
        assert_ne!(&rgba[0..4], &rgba[8..12]);
    }

    #[test]
    fn chart_has_requested_size_and_ink() {
        let table = SweepTable {
            rows: 10,
            cols: 10,
            runs: 1,
            seed: 0,
            results: vec![SweepRow { p: 0.5, island_density: 0.1, pool_density: 0.05 }],
        };
        let rgba = render_sweep(&table, 320, 200);
        assert_eq!(rgba.len(), 320 * 200 * 4);
        assert!(rgba.chunks_exact(4).any(|px| px == SIMULATED));
        assert!(rgba.chunks_exact(4).any(|px| px == THEORY));
    }
}
