/// Row-major flat grid. No per-cell objects.
/// `w` is the column count (n), `h` the row count (m); both axes wrap (torus).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Overwrite every cell without reallocating.
    pub fn fill(&mut self, v: T) {
        self.data.fill(v);
    }

    /// Match new dimensions. Storage is only reallocated when the cell count grows.
    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.data.clear();
        self.data.resize(w * h, T::default());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Copy + PartialEq> Grid<T> {
    pub fn count(&self, v: T) -> usize {
        self.data.iter().filter(|&&c| c == v).count()
    }
}

/// Neighbor rule used by one labeling pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Adjacency {
    /// Up, down, left, right.
    Orthogonal,
    /// Orthogonal plus the four diagonals.
    OrthogonalDiagonal,
}

const OFFSETS4: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

const OFFSETS8: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

impl Adjacency {
    /// Land is connected orthogonally, water through diagonals as well.
    #[inline]
    pub const fn for_target(target: bool) -> Self {
        if target {
            Adjacency::Orthogonal
        } else {
            Adjacency::OrthogonalDiagonal
        }
    }

    /// (dx, dy) offsets, fixed order.
    #[inline]
    pub const fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Adjacency::Orthogonal => &OFFSETS4,
            Adjacency::OrthogonalDiagonal => &OFFSETS8,
        }
    }
}

/// Step one cell by (dx, dy) with wrapping on both axes.
#[inline]
pub fn wrap_torus(x: usize, y: usize, dx: i32, dy: i32, w: usize, h: usize) -> (usize, usize) {
    let wx = (x as i64 + dx as i64).rem_euclid(w as i64) as usize;
    let wy = (y as i64 + dy as i64).rem_euclid(h as i64) as usize;
    (wx, wy)
}

/// Wrapped neighbors of (x, y). On grids narrower than 3 cells the same
/// neighbor can appear twice, and on 1-wide grids a cell is its own neighbor.
pub fn neighbors_torus(
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    adjacency: Adjacency,
) -> impl Iterator<Item = (usize, usize)> {
    adjacency
        .offsets()
        .iter()
        .map(move |&(dx, dy)| wrap_torus(x, y, dx, dy, w, h))
}
