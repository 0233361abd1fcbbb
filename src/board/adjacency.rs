//! The 8-tile neighborhood.
//!
//! Two tiles are adjacent when they share an edge or a corner. Neighbors are
//! clipped at the board edge, so corner tiles have 3 and edge tiles 5.

/// Offsets of the 8 neighbors, row by row.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterator over the in-bounds neighbor indices of one tile.
#[derive(Debug, Clone)]
pub struct Neighbors {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    next: usize,
}

impl Neighbors {
    /// Neighbors of tile `index` on a row-major `width` x `height` grid.
    pub fn new(width: u16, height: u16, index: usize) -> Self {
        let width = width as i32;
        Neighbors {
            x: index as i32 % width.max(1),
            y: index as i32 / width.max(1),
            width,
            height: height as i32,
            next: 0,
        }
    }
}

impl Iterator for Neighbors {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.next < NEIGHBOR_OFFSETS.len() {
            let (dx, dy) = NEIGHBOR_OFFSETS[self.next];
            self.next += 1;
            let nx = self.x + dx;
            let ny = self.y + dy;
            if nx >= 0 && ny >= 0 && nx < self.width && ny < self.height {
                return Some((ny * self.width + nx) as usize);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn corner_has_three_neighbors() {
        let n: Vec<usize> = Neighbors::new(4, 3, 0).collect();
        assert_eq!(sorted(n), vec![1, 4, 5]);
    }

    #[test]
    fn edge_has_five_neighbors() {
        let n: Vec<usize> = Neighbors::new(4, 3, 1).collect();
        assert_eq!(sorted(n), vec![0, 2, 4, 5, 6]);
    }

    #[test]
    fn interior_has_eight_neighbors() {
        let n: Vec<usize> = Neighbors::new(4, 3, 5).collect();
        assert_eq!(sorted(n), vec![0, 1, 2, 4, 6, 8, 9, 10]);
    }

    #[test]
    fn neighbors_do_not_wrap_rows() {
        // Index 3 is the right end of row 0; index 4 starts row 1.
        let n: Vec<usize> = Neighbors::new(4, 3, 3).collect();
        assert!(!n.contains(&4));
        assert_eq!(sorted(n), vec![2, 6, 7]);
    }
}
