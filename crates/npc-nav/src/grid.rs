use crate::{NavPath, Navigator, PathRequest, TraversalMask, Vec2};
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// Neighbor expansion order: N, E, S, W. Fixed so equal-cost routes come out the same.
const STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// 4-connected grid with per-cell terrain layers, searched with A*.
#[derive(Debug, Clone)]
pub struct NavGrid {
    width: i32,
    height: i32,
    cell_size: f32,
    layers: Vec<TraversalMask>,
}

impl NavGrid {
    /// Grid of `GROUND` cells.
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        assert!(width > 0 && height > 0, "grid must be non-empty");
        assert!(cell_size > 0.0, "cell_size must be > 0");
        Self {
            width: width as i32,
            height: height as i32,
            cell_size,
            layers: vec![TraversalMask::GROUND; width as usize * height as usize],
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn set_layers(&mut self, x: i32, y: i32, layers: TraversalMask) {
        if let Some(idx) = self.index(x, y) {
            self.layers[idx] = layers;
        }
    }

    /// `NONE` outside the grid.
    pub fn layers(&self, x: i32, y: i32) -> TraversalMask {
        self.index(x, y)
            .map_or(TraversalMask::NONE, |idx| self.layers[idx])
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        let layers = if blocked {
            TraversalMask::NONE
        } else {
            TraversalMask::GROUND
        };
        self.set_layers(x, y, layers);
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.layers(x, y) == TraversalMask::NONE
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let inside = (0..self.width).contains(&x) && (0..self.height).contains(&y);
        inside.then(|| (y * self.width + x) as usize)
    }

    fn coords(&self, idx: usize) -> (i32, i32) {
        let idx = idx as i32;
        (idx % self.width, idx / self.width)
    }

    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn center(&self, idx: usize) -> Vec2 {
        let (x, y) = self.coords(idx);
        Vec2::new(
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }

    /// Cell indices from the start cell to the first accepted cell. The start cell is always
    /// enterable: the mover is already standing in it.
    fn search(&self, request: &PathRequest) -> Option<Vec<usize>> {
        let (sx, sy) = self.cell_of(request.start);
        let goal = self.cell_of(request.goal);
        let start = self.index(sx, sy)?;

        // Cells within `proximity` of the goal end the search early, so the Manhattan
        // estimate may overshoot by up to that many cells in each axis.
        let slack = 2 * (request.proximity / self.cell_size).ceil() as u32;
        let estimate = |idx: usize| {
            let (x, y) = self.coords(idx);
            ((x - goal.0).unsigned_abs() + (y - goal.1).unsigned_abs()).saturating_sub(slack)
        };
        let accepts = |idx: usize| self.coords(idx) == goal || request.accepts(self.center(idx));

        let mut cost = vec![u32::MAX; self.layers.len()];
        let mut parent: Vec<Option<usize>> = vec![None; self.layers.len()];
        // Min-heap on (f, g, index): ties resolve to the lower index.
        let mut open = BinaryHeap::new();

        cost[start] = 0;
        open.push(Reverse((estimate(start), 0u32, start)));

        while let Some(Reverse((_, g, current))) = open.pop() {
            if g != cost[current] {
                continue;
            }
            if accepts(current) {
                let mut route = vec![current];
                let mut at = current;
                while let Some(prev) = parent[at] {
                    route.push(prev);
                    at = prev;
                }
                route.reverse();
                return Some(route);
            }

            let (x, y) = self.coords(current);
            for (dx, dy) in STEPS {
                let Some(next) = self.index(x + dx, y + dy) else {
                    continue;
                };
                if !self.layers[next].intersects(request.mask) {
                    continue;
                }
                let next_g = g + 1;
                if next_g < cost[next] {
                    cost[next] = next_g;
                    parent[next] = Some(current);
                    open.push(Reverse((next_g + estimate(next), next_g, next)));
                }
            }
        }

        None
    }
}

impl Navigator for NavGrid {
    fn find_path(&self, request: &PathRequest) -> Option<NavPath> {
        if request.accepts(request.start) {
            return Some(NavPath::new(vec![request.start]));
        }

        let route = self.search(request)?;
        let goal = self.cell_of(request.goal);
        let last = route.len() - 1;

        // Keep the exact start; finish on the goal point itself when its cell was reached.
        let mut points = Vec::with_capacity(route.len() + 1);
        points.push(request.start);
        for (i, &idx) in route.iter().enumerate().skip(1) {
            if i == last && self.coords(idx) == goal {
                points.push(request.goal);
            } else {
                points.push(self.center(idx));
            }
        }
        if last == 0 {
            // Accepted without leaving the start cell.
            let end = if self.coords(route[0]) == goal {
                request.goal
            } else {
                self.center(route[0])
            };
            points.push(end);
        }
        Some(NavPath::new(points))
    }
}
