use crate::field::Field;
use crate::grid::{Adjacency, Grid, wrap_torus};

/// Label grid of one pass: 0 = not the target value, 1..=count = component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labeling {
    pub labels: Grid<u32>,
    pub count: usize,
    pub target: bool,
}

impl Labeling {
    /// Cells per label. Index 0 holds the unlabeled cells.
    pub fn component_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.count + 1];
        for &l in &self.labels.data {
            sizes[l as usize] += 1;
        }
        sizes
    }

    pub fn adjacency(&self) -> Adjacency {
        Adjacency::for_target(self.target)
    }
}

/// Breadth-first component labeler on a torus.
///
/// Owns the label grid and a FIFO of flat indices sized to the grid, both
/// reused across calls. Labels are handed out in row-major order of each
/// component's first cell, so identical fields always label identically.
#[derive(Clone, Debug)]
pub struct Labeler {
    labels: Grid<u32>,
    queue: Vec<u32>,
    count: usize,
    target: bool,
}

impl Labeler {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            labels: Grid::new(w, h),
            queue: Vec::with_capacity(w * h),
            count: 0,
            target: true,
        }
    }

    /// Label every `target` cell of `field`. Returns the component count.
    pub fn label(&mut self, field: &Field, target: bool) -> usize {
        let (w, h) = (field.w, field.h);
        if self.labels.w != w || self.labels.h != h {
            self.labels.resize(w, h);
            self.queue.reserve(w * h);
        } else {
            self.labels.fill(0);
        }

        let offsets = Adjacency::for_target(target).offsets();
        let mut next = 0u32;

        for seed in 0..w * h {
            if field.data[seed] != target || self.labels.data[seed] != 0 {
                continue;
            }
            next += 1;
            self.labels.data[seed] = next;
            self.queue.clear();
            self.queue.push(seed as u32);

            // Queue only grows by cells labeled here, so it never exceeds w*h.
            let mut head = 0;
            while head < self.queue.len() {
                let i = self.queue[head] as usize;
                head += 1;
                let (x, y) = (i % w, i / w);
                for &(dx, dy) in offsets {
                    let (nx, ny) = wrap_torus(x, y, dx, dy, w, h);
                    let ni = ny * w + nx;
                    if field.data[ni] == target && self.labels.data[ni] == 0 {
                        self.labels.data[ni] = next;
                        self.queue.push(ni as u32);
                    }
                }
            }
        }

        self.count = next as usize;
        self.target = target;
        self.count
    }

    pub fn labels(&self) -> &Grid<u32> {
        &self.labels
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Copy the last result out.
    pub fn to_labeling(&self) -> Labeling {
        Labeling {
            labels: self.labels.clone(),
            count: self.count,
            target: self.target,
        }
    }

    pub fn into_labeling(self) -> Labeling {
        Labeling {
            labels: self.labels,
            count: self.count,
            target: self.target,
        }
    }
}

/// One-shot labeling. `true` labels islands, `false` labels pools.
pub fn label(field: &Field, target: bool) -> Labeling {
    let mut labeler = Labeler::new(field.w, field.h);
    labeler.label(field, target);
    labeler.into_labeling()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::generate;
    use crate::rng::stream;

    fn field_from(rows: &[&str]) -> Field {
        let h = rows.len();
        let w = rows[0].len();
        let mut f = Field::new(w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                f.set(x, y, c == '#');
            }
        }
        f
    }

    #[test]
    fn full_land_is_one_island() {
        for (w, h) in [(1, 1), (1, 4), (4, 1), (2, 2), (7, 5)] {
            let mut f = Field::new(w, h);
            f.fill(true);
            let l = label(&f, true);
            assert_eq!(l.count, 1);
            assert!(l.labels.data.iter().all(|&v| v == 1));
        }
    }

    #[test]
    fn no_land_no_islands() {
        let f = Field::new(6, 3);
        let l = label(&f, true);
        assert_eq!(l.count, 0);
        assert!(l.labels.data.iter().all(|&v| v == 0));
        // the same field is one pool
        assert_eq!(label(&f, false).count, 1);
    }

    #[test]
    fn ring_wraps_around() {
        let f = field_from(&["#.#"]);
        let l = label(&f, true);
        assert_eq!(l.count, 1);
        assert_eq!(l.labels.data, vec![1, 0, 1]);
    }

    #[test]
    fn column_ring_wraps_around() {
        let f = field_from(&["#", ".", "#"]);
        assert_eq!(label(&f, true).count, 1);
    }

    #[test]
    fn labels_follow_row_major_seed_order() {
        let f = field_from(&[
            ".#...",
            "...#.",
            "#....",
        ]);
        let l = label(&f, true);
        assert_eq!(l.count, 3);
        assert_eq!(l.labels.get(1, 0), 1);
        assert_eq!(l.labels.get(3, 1), 2);
        assert_eq!(l.labels.get(0, 2), 3);
    }

    #[test]
    fn diagonals_join_water_but_not_land() {
        let f = field_from(&[
            "#...",
            ".#..",
            "....",
            "....",
        ]);
        assert_eq!(label(&f, true).count, 2);

        let g = field_from(&[
            ".###",
            "#.##",
            "####",
            "####",
        ]);
        assert_eq!(label(&g, false).count, 1);
        assert_eq!(label(&g, true).count, 1);
    }

    #[test]
    fn edge_components_merge_across_seam() {
        let f = field_from(&[
            "#...#",
            ".....",
            "#...#",
        ]);
        // all four corners touch through the wrap
        let l = label(&f, true);
        assert_eq!(l.count, 1);
        assert_eq!(l.component_sizes(), vec![11, 4]);
    }

    #[test]
    fn two_by_two_checkerboard() {
        let f = field_from(&["#.", ".#"]);
        // orthogonal neighbors of a land cell are both water
        assert_eq!(label(&f, true).count, 2);
        assert_eq!(label(&f, false).count, 1);
    }

    #[test]
    fn reused_labeler_matches_one_shot() {
        let mut labeler = Labeler::new(1, 1);
        for seed in 0..5 {
            let f = generate(13, 17, 0.55, &mut stream(seed)).unwrap();
            for target in [true, false] {
                let count = labeler.label(&f, target);
                let fresh = label(&f, target);
                assert_eq!(count, fresh.count);
                assert_eq!(labeler.labels(), &fresh.labels);
                assert_eq!(labeler.to_labeling(), fresh);
            }
        }
    }

    #[test]
    fn labeler_adapts_to_new_dimensions() {
        let mut labeler = Labeler::new(3, 3);
        let f = field_from(&["#.#.#.#."]);
        assert_eq!(labeler.label(&f, true), 4);
        assert_eq!(labeler.labels().w, 8);
        assert_eq!(labeler.count(), 4);
    }
}
