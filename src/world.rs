use crate::block::{Block, BlockId, Footprint};
use crate::error::{Result, SimError};
use crate::point::{GridPoint, Point};
use std::collections::HashSet;

/// Default edge length of a coarse grid square in world units
pub const DEFAULT_CELL_SIZE: i32 = 20;

/// Upper bound on up-front allocation for one rasterized segment
const MAX_RASTER_PREALLOC: usize = 4096;

/// One coarse placement cell; holds at most one block
#[derive(Debug, Clone, PartialEq)]
pub struct GridSquare {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub heading: f64,
    block: Option<BlockId>,
}

impl GridSquare {
    fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        GridSquare {
            x,
            y,
            width,
            height,
            heading: 0.0,
            block: None,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.height as f64 / 2.0
    }

    pub fn is_occupied(&self) -> bool {
        self.block.is_some()
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }
}

/// Placeable shape offered to the editor, sized in coarse cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellType {
    pub id: &'static str,
    pub label: &'static str,
    pub cells_wide: u32,
    pub cells_high: u32,
    pub color: [u8; 3],
}

const CELL_TYPES: [CellType; 6] = [
    CellType { id: "g_onexone1", label: "1x1 #1", cells_wide: 1, cells_high: 1, color: [0, 0, 255] },
    CellType { id: "g_onexone2", label: "1x1 #2", cells_wide: 1, cells_high: 1, color: [0, 255, 0] },
    CellType { id: "g_onexone3", label: "1x1 #3", cells_wide: 1, cells_high: 1, color: [255, 0, 0] },
    CellType { id: "g_twoxtwo1", label: "2x2 #1", cells_wide: 2, cells_high: 2, color: [0, 0, 255] },
    CellType { id: "g_twoxone1", label: "2x1 #1", cells_wide: 2, cells_high: 1, color: [0, 0, 0] },
    CellType { id: "g_onextwo1", label: "1x2 #2", cells_wide: 1, cells_high: 2, color: [0, 0, 0] },
];

/// Axis-aligned world boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// What a successful toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Placed(BlockId),
    Removed(BlockId),
}

/// Occupancy grid: one [`Point`] per world unit plus a coarse partition of
/// [`GridSquare`]s used to author obstacles.
#[derive(Debug, Clone)]
pub struct World {
    width: i32,
    height: i32,
    cell_width: i32,
    cell_height: i32,
    points: Vec<Point>,
    grid_cols: i32,
    grid_rows: i32,
    grid: Vec<GridSquare>,
    /// Placed blocks in insertion order
    blocks: Vec<(BlockId, Block)>,
    next_block_id: u64,
    /// Incremented whenever occupancy changes
    revision: u64,
}

impl World {
    /// Create a world with the default 20x20 coarse partition
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Self::with_cell_size(width, height, DEFAULT_CELL_SIZE, DEFAULT_CELL_SIZE)
    }

    pub fn with_cell_size(width: i32, height: i32, cell_width: i32, cell_height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        if cell_width <= 0 || cell_height <= 0 {
            return Err(SimError::InvalidDimensions {
                width: cell_width,
                height: cell_height,
            });
        }

        let mut points = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                points.push(Point::new(x, y));
            }
        }

        let grid_cols = width / cell_width;
        let grid_rows = height / cell_height;
        let mut grid = Vec::with_capacity((grid_cols * grid_rows) as usize);
        for cy in 0..grid_rows {
            for cx in 0..grid_cols {
                grid.push(GridSquare::new(
                    cx * cell_width,
                    cy * cell_height,
                    cell_width,
                    cell_height,
                ));
            }
        }

        log::debug!(
            "World {}x{} created with {}x{} grid squares of {}x{}",
            width,
            height,
            grid_cols,
            grid_rows,
            cell_width,
            cell_height
        );

        Ok(World {
            width,
            height,
            cell_width,
            cell_height,
            points,
            grid_cols,
            grid_rows,
            grid,
            blocks: Vec::new(),
            next_block_id: 0,
            revision: 0,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    /// Number of coarse grid squares as (columns, rows)
    pub fn grid_size(&self) -> (i32, i32) {
        (self.grid_cols, self.grid_rows)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn boundary(&self) -> Boundary {
        Boundary {
            x: 0.0,
            y: 0.0,
            width: self.width as f64,
            height: self.height as f64,
        }
    }

    pub fn cell_types(&self) -> &'static [CellType] {
        &CELL_TYPES
    }

    /// Placed blocks in insertion order
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().map(|(id, block)| (*id, block))
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|(bid, _)| *bid == id)
            .map(|(_, block)| block)
    }

    /// Every point, row by row
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn get_id(&self, x: i32, y: i32) -> usize {
        (x + y * self.width) as usize
    }

    pub fn point(&self, x: i32, y: i32) -> Option<&Point> {
        if self.in_bounds(x, y) {
            Some(&self.points[self.get_id(x, y)])
        } else {
            None
        }
    }

    /// Occupancy lookup; anything outside the grid reads as free
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.point(x, y).map_or(false, Point::is_occupied)
    }

    pub fn occupant(&self, x: i32, y: i32) -> Option<BlockId> {
        self.point(x, y).and_then(Point::owner)
    }

    /// Coarse square at column `cx`, row `cy`
    pub fn grid_square(&self, cx: i32, cy: i32) -> Option<&GridSquare> {
        if cx >= 0 && cx < self.grid_cols && cy >= 0 && cy < self.grid_rows {
            Some(&self.grid[(cx + cy * self.grid_cols) as usize])
        } else {
            None
        }
    }

    /// Place a block and mark every point of its footprint as occupied by it.
    ///
    /// The footprint must lie inside the boundary rectangle; nothing is
    /// touched when it does not. The far boundary edge (x == width or
    /// y == height) has no points and is skipped.
    pub fn add_block(&mut self, block: Block) -> Result<BlockId> {
        for (name, value) in [("block.width", block.width()), ("block.height", block.height())] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidSetting {
                    name,
                    value,
                    reason: "must be finite and greater than zero",
                });
            }
        }
        let fp = block.footprint();
        if fp.x0 < 0 || fp.y0 < 0 || fp.x1 > self.width || fp.y1 > self.height {
            let (x, y) = if fp.x0 < 0 || fp.y0 < 0 {
                (fp.x0, fp.y0)
            } else {
                (fp.x1, fp.y1)
            };
            return Err(SimError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.stamp(id, fp, false);
        self.blocks.push((id, block));
        self.revision += 1;

        log::debug!("Placed block {} over ({},{})..=({},{})", id, fp.x0, fp.y0, fp.x1, fp.y1);
        Ok(id)
    }

    /// Remove a block and clear the points it owned.
    ///
    /// Blocks overlapping the removed footprint (e.g. a neighbour sharing an
    /// edge row) are stamped back so their cover stays intact.
    pub fn remove_block(&mut self, id: BlockId) -> Result<Block> {
        let index = self
            .blocks
            .iter()
            .position(|(bid, _)| *bid == id)
            .ok_or(SimError::UnknownBlock(id.0))?;
        let (_, block) = self.blocks.remove(index);
        let fp = block.footprint();

        for (x, y) in self.clamped(fp) {
            let pid = self.get_id(x, y);
            if self.points[pid].owner() == Some(id) {
                self.points[pid].unoccupy();
            }
        }

        let overlapping: Vec<(BlockId, Footprint)> = self
            .blocks
            .iter()
            .filter_map(|(bid, other)| other.footprint().intersect(&fp).map(|shared| (*bid, shared)))
            .collect();
        for (bid, shared) in overlapping {
            self.stamp(bid, shared, true);
        }

        for square in self.grid.iter_mut() {
            if square.block == Some(id) {
                square.block = None;
            }
        }

        self.revision += 1;
        log::debug!("Removed block {}", id);
        Ok(block)
    }

    fn stamp(&mut self, id: BlockId, fp: Footprint, only_free: bool) {
        for (x, y) in self.clamped(fp) {
            let pid = self.get_id(x, y);
            if !only_free || !self.points[pid].is_occupied() {
                self.points[pid].occupy(id);
            }
        }
    }

    /// Footprint coordinates that have backing points
    fn clamped(&self, fp: Footprint) -> impl Iterator<Item = (i32, i32)> {
        let x0 = fp.x0.max(0);
        let y0 = fp.y0.max(0);
        let x1 = fp.x1.min(self.width - 1);
        let y1 = fp.y1.min(self.height - 1);
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }

    /// Flip the coarse square containing world point (x, y) between free and blocked
    pub fn toggle_cell(&mut self, x: i32, y: i32) -> Result<Toggle> {
        let out_of_bounds = SimError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        };
        if x < 0 || y < 0 {
            return Err(out_of_bounds);
        }
        let cx = x / self.cell_width;
        let cy = y / self.cell_height;
        if cx >= self.grid_cols || cy >= self.grid_rows {
            return Err(out_of_bounds);
        }
        let sid = (cx + cy * self.grid_cols) as usize;

        match self.grid[sid].block {
            None => {
                let square = &self.grid[sid];
                let block = Block::new(
                    square.width as f64,
                    square.height as f64,
                    square.center_x(),
                    square.center_y(),
                    square.heading,
                );
                let id = self.add_block(block)?;
                self.grid[sid].block = Some(id);
                Ok(Toggle::Placed(id))
            }
            Some(id) => {
                self.remove_block(id)?;
                Ok(Toggle::Removed(id))
            }
        }
    }

    /// Integer points on the segment (x1, y1) -> (x2, y2), nearest first.
    ///
    /// Samples the segment at equal arc-length steps of one unit and floors
    /// each sample; repeated cells are dropped, keeping first occurrence
    /// order. The endpoint's cell is always included so segments shorter
    /// than one unit still reach their end. Non-finite input has no points.
    pub fn rasterize_segment(x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<GridPoint> {
        let distance = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt();
        if !distance.is_finite() {
            return Vec::new();
        }
        let steps = distance.floor() as usize;
        let capacity = steps.saturating_add(1).min(MAX_RASTER_PREALLOC);

        let mut seen = HashSet::with_capacity(capacity);
        let mut line = Vec::with_capacity(capacity);

        for i in 0..=steps {
            let progress = if distance > 0.0 { i as f64 / distance } else { 0.0 };
            let p = GridPoint::from_world(
                x1 + (x2 - x1) * progress,
                y1 + (y2 - y1) * progress,
            );
            if seen.insert(p) {
                line.push(p);
            }
        }

        let end = GridPoint::from_world(x2, y2);
        if seen.insert(end) {
            line.push(end);
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_dimensions() {
        assert!(matches!(
            World::new(0, 10),
            Err(SimError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(matches!(World::new(10, -1), Err(SimError::InvalidDimensions { .. })));
        assert!(matches!(
            World::with_cell_size(100, 100, 0, 20),
            Err(SimError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_points_allocated_for_whole_grid() {
        let world = World::new(40, 30).unwrap();
        assert_eq!(world.points().len(), 40 * 30);
        assert!(world.point(39, 29).unwrap().matches(39, 29));
        assert!(world.point(40, 0).is_none());
        assert_eq!(world.grid_size(), (2, 1));
        assert_eq!(world.cell_types().len(), 6);
    }

    #[test]
    fn test_add_block_occupies_footprint() {
        let mut world = World::new(100, 100).unwrap();
        let id = world.add_block(Block::new(10.0, 6.0, 20.0, 30.0, 0.0)).unwrap();
        let fp = world.block(id).unwrap().footprint();

        for y in fp.y0..=fp.y1 {
            for x in fp.x0..=fp.x1 {
                assert!(world.is_occupied(x, y), "({}, {}) should be occupied", x, y);
                assert_eq!(world.occupant(x, y), Some(id));
            }
        }
        assert!(!world.is_occupied(fp.x0 - 1, fp.y0));
        assert!(!world.is_occupied(fp.x1 + 1, fp.y1));

        world.remove_block(id).unwrap();
        for y in fp.y0..=fp.y1 {
            for x in fp.x0..=fp.x1 {
                assert!(!world.is_occupied(x, y));
            }
        }
        assert_eq!(world.blocks().count(), 0);
    }

    #[test]
    fn test_add_block_out_of_bounds_is_rejected_untouched() {
        let mut world = World::new(50, 50).unwrap();
        let result = world.add_block(Block::new(20.0, 20.0, 5.0, 25.0, 0.0));
        assert!(matches!(result, Err(SimError::OutOfBounds { .. })));
        let result = world.add_block(Block::new(20.0, 20.0, 45.0, 25.0, 0.0));
        assert!(matches!(result, Err(SimError::OutOfBounds { .. })));

        assert_eq!(world.revision(), 0);
        assert!(world.points().iter().all(|p| !p.is_occupied()));
    }

    #[test]
    fn test_block_touching_far_edge_is_accepted() {
        let mut world = World::new(40, 40).unwrap();
        let id = world.add_block(Block::new(20.0, 20.0, 30.0, 30.0, 0.0)).unwrap();
        assert_eq!(world.occupant(39, 39), Some(id));
    }

    #[test]
    fn test_remove_unknown_block() {
        let mut world = World::new(10, 10).unwrap();
        assert!(matches!(world.remove_block(BlockId(3)), Err(SimError::UnknownBlock(3))));
    }

    #[test]
    fn test_toggle_cell_places_then_removes() {
        let mut world = World::new(200, 200).unwrap();

        let placed = world.toggle_cell(50, 50).unwrap();
        let id = match placed {
            Toggle::Placed(id) => id,
            other => panic!("expected placement, got {:?}", other),
        };
        let square = world.grid_square(2, 2).unwrap();
        assert!(square.is_occupied());
        assert_eq!(square.block(), Some(id));

        let block = world.block(id).unwrap();
        assert_eq!(block.center_x(), 50.0);
        assert_eq!(block.center_y(), 50.0);
        assert!(world.is_occupied(40, 40));
        assert!(world.is_occupied(60, 60));

        assert_eq!(world.toggle_cell(41, 59).unwrap(), Toggle::Removed(id));
        assert!(!world.grid_square(2, 2).unwrap().is_occupied());
        assert!(!world.is_occupied(50, 50));
    }

    #[test]
    fn test_toggle_cell_out_of_bounds() {
        let mut world = World::new(200, 200).unwrap();
        assert!(matches!(world.toggle_cell(-1, 5), Err(SimError::OutOfBounds { .. })));
        assert!(matches!(world.toggle_cell(200, 5), Err(SimError::OutOfBounds { .. })));
        assert!(matches!(world.toggle_cell(5, 1000), Err(SimError::OutOfBounds { .. })));
        assert_eq!(world.blocks().count(), 0);
    }

    #[test]
    fn test_toggle_last_cell_in_world() {
        let mut world = World::new(200, 200).unwrap();
        assert!(matches!(world.toggle_cell(199, 199), Ok(Toggle::Placed(_))));
        assert!(world.is_occupied(199, 199));
    }

    #[test]
    fn test_removing_neighbour_keeps_shared_edge() {
        let mut world = World::new(100, 100).unwrap();
        let left = match world.toggle_cell(10, 10).unwrap() {
            Toggle::Placed(id) => id,
            other => panic!("unexpected {:?}", other),
        };
        let right = match world.toggle_cell(30, 10).unwrap() {
            Toggle::Placed(id) => id,
            other => panic!("unexpected {:?}", other),
        };
        // x = 20 is covered by both inclusive footprints
        assert_eq!(world.occupant(20, 10), Some(right));

        world.toggle_cell(30, 10).unwrap();
        assert_eq!(world.occupant(20, 10), Some(left));
        assert!(!world.is_occupied(21, 10));
    }

    #[test]
    fn test_blocks_iterate_in_insertion_order() {
        let mut world = World::new(100, 100).unwrap();
        world.toggle_cell(70, 70).unwrap();
        world.toggle_cell(10, 10).unwrap();
        world.toggle_cell(30, 70).unwrap();
        let centers: Vec<(f64, f64)> = world
            .blocks()
            .map(|(_, b)| (b.center_x(), b.center_y()))
            .collect();
        assert_eq!(centers, vec![(70.0, 70.0), (10.0, 10.0), (30.0, 70.0)]);
    }

    #[test]
    fn test_rasterize_zero_length() {
        let line = World::rasterize_segment(4.0, 7.0, 4.0, 7.0);
        assert_eq!(line, vec![GridPoint::new(4, 7)]);
    }

    #[test]
    fn test_rasterize_axis_aligned() {
        let line = World::rasterize_segment(0.5, 0.5, 0.5, 5.5);
        let expected: Vec<GridPoint> = (0..=5).map(|y| GridPoint::new(0, y)).collect();
        assert_eq!(line, expected);
    }

    #[test]
    fn test_rasterize_non_finite_segment_is_empty() {
        assert!(World::rasterize_segment(0.0, 0.0, f64::INFINITY, 0.0).is_empty());
        assert!(World::rasterize_segment(0.0, f64::NEG_INFINITY, 5.0, 5.0).is_empty());
        assert!(World::rasterize_segment(f64::NAN, 0.0, 5.0, 5.0).is_empty());
    }

    #[test]
    fn test_rasterize_long_segment_is_complete() {
        // longer than the preallocation bound
        let line = World::rasterize_segment(0.5, 0.5, 10_000.5, 0.5);
        assert_eq!(line.len(), 10_001);
        assert_eq!(line.last(), Some(&GridPoint::new(10_000, 0)));
    }

    #[test]
    fn test_degenerate_block_is_rejected() {
        let mut world = World::new(100, 100).unwrap();
        assert!(matches!(
            world.add_block(Block::new(-20.0, 10.0, 50.0, 50.0, 0.0)),
            Err(SimError::InvalidSetting { name: "block.width", .. })
        ));
        assert!(matches!(
            world.add_block(Block::new(10.0, 0.0, 50.0, 50.0, 0.0)),
            Err(SimError::InvalidSetting { name: "block.height", .. })
        ));
        assert_eq!(world.blocks().count(), 0);
        assert_eq!(world.revision(), 0);
    }

    #[test]
    fn test_rasterize_short_segment_reaches_end() {
        let line = World::rasterize_segment(0.2, 0.2, 1.1, 0.4);
        assert_eq!(line, vec![GridPoint::new(0, 0), GridPoint::new(1, 0)]);
    }

    #[test]
    fn test_rasterize_is_ordered_and_unique() {
        let line = World::rasterize_segment(10.5, 3.5, 40.5, 17.5);
        assert_eq!(line.first(), Some(&GridPoint::new(10, 3)));
        assert_eq!(line.last(), Some(&GridPoint::new(40, 17)));

        let unique: HashSet<_> = line.iter().collect();
        assert_eq!(unique.len(), line.len());

        // each step moves at most one cell along either axis
        for pair in line.windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
        }
    }

    #[test]
    fn test_rasterize_free_path_has_no_occupied_points() {
        let mut world = World::new(100, 100).unwrap();
        world.toggle_cell(90, 90).unwrap();
        let line = World::rasterize_segment(5.0, 5.0, 5.0, 95.0);
        assert!(line.iter().all(|p| !world.is_occupied(p.x, p.y)));
    }
}
