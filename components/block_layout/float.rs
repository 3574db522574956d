/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Float layout.
//!
//! See CSS 2.1 § 9.5.1: <https://www.w3.org/TR/CSS2/visuren.html#float-position>

use std::ops::Range;

use app_units::{Au, MAX_AU, MIN_AU};
use euclid::num::Zero;
use rustc_hash::FxHashSet;
use servo_arc::Arc;

use crate::box_tree::BoxId;
use crate::geom::{LogicalRect, LogicalVec2};
use crate::style::{self, Direction};

/// Whether the float is aligned to the inline-start or inline-end side of its containing block.
///
/// See CSS 2.1 § 9.5.1: <https://www.w3.org/TR/CSS2/visuren.html#float-position>
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FloatSide {
    InlineStart,
    InlineEnd,
}

impl FloatSide {
    pub(crate) fn from_style(float: style::Float, direction: Direction) -> Option<FloatSide> {
        let ltr = direction == Direction::Ltr;
        Some(match float {
            style::Float::None => return None,
            style::Float::InlineStart => Self::InlineStart,
            style::Float::InlineEnd => Self::InlineEnd,
            style::Float::Left if ltr => Self::InlineStart,
            style::Float::Left => Self::InlineEnd,
            style::Float::Right if ltr => Self::InlineEnd,
            style::Float::Right => Self::InlineStart,
        })
    }
}

/// The sides whose floats a box must be placed below, in terms of the
/// formatting context's direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Clear {
    None,
    InlineStart,
    InlineEnd,
    Both,
}

impl Clear {
    pub(crate) fn from_style(clear: style::Clear, direction: Direction) -> Self {
        let ltr = direction == Direction::Ltr;
        match clear {
            style::Clear::None => Self::None,
            style::Clear::Both => Self::Both,
            style::Clear::InlineStart => Self::InlineStart,
            style::Clear::InlineEnd => Self::InlineEnd,
            style::Clear::Left if ltr => Self::InlineStart,
            style::Clear::Left => Self::InlineEnd,
            style::Clear::Right if ltr => Self::InlineEnd,
            style::Clear::Right => Self::InlineStart,
        }
    }
}

/// Information needed to place a float so that it doesn't collide with existing floats.
#[derive(Clone, Debug)]
pub struct PlacementInfo {
    /// The *margin* box size of the float.
    pub size: LogicalVec2<Au>,
    /// Which side of the containing block the float is aligned to.
    pub side: FloatSide,
    /// Which side or sides to clear existing floats on.
    pub clear: Clear,
}

/// The inline-start and inline-end content edges of the containing block of
/// a float, relative to the formatting context root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatWalls {
    pub inline_start: Au,
    pub inline_end: Au,
}

/// A floated box registered with the formatting context that places it.
#[derive(Clone, Debug)]
pub struct FloatEntry {
    pub box_id: BoxId,
    pub side: FloatSide,
    /// The margin box, relative to the formatting context root.
    pub rect: LogicalRect<Au>,
    /// The single box responsible for painting this float.
    pub painter: BoxId,
    pub placed: bool,
}

/// The state of a [`FloatRegistry`] at some point, so that layout of a child can be undone.
#[derive(Clone, Debug)]
pub struct FloatCheckpoint {
    entry_count: usize,
    bands: FloatBands,
    ceiling_from_floats: Au,
    clear_inline_start_position: Option<Au>,
    clear_inline_end_position: Option<Au>,
}

/// The floats of one formatting context, owned by the formatting context root.
///
/// All coordinates are relative to the border box of the formatting context root.
#[derive(Clone, Debug)]
pub struct FloatRegistry {
    entries: Vec<FloatEntry>,
    bands: FloatBands,
    /// No float may start above the top of an earlier float.
    ceiling_from_floats: Au,
    /// The lowest margin edge of the placed inline-start floats.
    clear_inline_start_position: Option<Au>,
    /// The lowest margin edge of the placed inline-end floats.
    clear_inline_end_position: Option<Au>,
}

impl Default for FloatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatRegistry {
    pub fn new() -> Self {
        FloatRegistry {
            entries: Vec::new(),
            bands: FloatBands::new(),
            ceiling_from_floats: MIN_AU,
            clear_inline_start_position: None,
            clear_inline_end_position: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FloatEntry] {
        &self.entries
    }

    /// Registers a float that has not been placed yet. Returns its index.
    pub fn insert(&mut self, box_id: BoxId, side: FloatSide, painter: BoxId) -> usize {
        self.entries.push(FloatEntry {
            box_id,
            side,
            rect: LogicalRect::zero(),
            painter,
            placed: false,
        });
        self.entries.len() - 1
    }

    pub fn checkpoint(&self) -> FloatCheckpoint {
        FloatCheckpoint {
            entry_count: self.entries.len(),
            bands: self.bands.clone(),
            ceiling_from_floats: self.ceiling_from_floats,
            clear_inline_start_position: self.clear_inline_start_position,
            clear_inline_end_position: self.clear_inline_end_position,
        }
    }

    /// Forgets every float registered since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: &FloatCheckpoint) {
        self.entries.truncate(checkpoint.entry_count);
        self.bands = checkpoint.bands.clone();
        self.ceiling_from_floats = checkpoint.ceiling_from_floats;
        self.clear_inline_start_position = checkpoint.clear_inline_start_position;
        self.clear_inline_end_position = checkpoint.clear_inline_end_position;
    }

    /// The lowest margin edge of the placed floats on the given side or sides.
    pub fn lowest_bottom(&self, clear: Clear) -> Option<Au> {
        match clear {
            Clear::None => None,
            Clear::InlineStart => self.clear_inline_start_position,
            Clear::InlineEnd => self.clear_inline_end_position,
            Clear::Both => match (
                self.clear_inline_start_position,
                self.clear_inline_end_position,
            ) {
                (Some(start), Some(end)) => Some(start.max(end)),
                (start, end) => start.or(end),
            },
        }
    }

    /// The position a box with `clear` must be placed at or below.
    pub fn clearance_position(&self, clear: Clear, ceiling: Au) -> Au {
        match self.lowest_bottom(clear) {
            Some(bottom) => ceiling.max(bottom),
            None => ceiling,
        }
    }

    /// Determines where a float with the given placement would go, but leaves the registry
    /// unmodified. Returns the start corner of its margin box.
    pub fn place_object(
        &self,
        object: &PlacementInfo,
        ceiling: Au,
        walls: &FloatWalls,
    ) -> LogicalVec2<Au> {
        let mut block_start = self
            .clearance_position(object.clear, ceiling)
            .max(self.ceiling_from_floats);

        // Walk down band by band until the float fits next to everything it would cross.
        let mut crossed = self.bands.crossed_by(block_start, object.size.block).0;
        while !crossed.fits_float(object, walls) {
            let Some(next) = self.bands.next_band_start(block_start) else {
                break;
            };
            block_start = next;
            crossed = self.bands.crossed_by(block_start, object.size.block).0;
        }

        let inline = match object.side {
            FloatSide::InlineStart => crossed
                .start_edge
                .map_or(walls.inline_start, |edge| edge.max(walls.inline_start)),
            FloatSide::InlineEnd => {
                crossed
                    .end_edge
                    .map_or(walls.inline_end, |edge| edge.min(walls.inline_end)) -
                    object.size.inline
            },
        };
        LogicalVec2 {
            inline,
            block: block_start,
        }
    }

    /// Places the float registered at `index`. Returns its margin box.
    pub fn place(
        &mut self,
        index: usize,
        object: &PlacementInfo,
        ceiling: Au,
        walls: &FloatWalls,
    ) -> LogicalRect<Au> {
        let origin = self.place_object(object, ceiling, walls);
        let rect = LogicalRect {
            start_corner: origin,
            size: object.size,
        };
        self.exclude(&rect, object.side);

        if let Some(entry) = self.entries.get_mut(index) {
            entry.rect = rect;
            entry.side = object.side;
            entry.placed = true;
        }
        rect
    }

    /// Takes the area of a placed float away from later floats and avoiders.
    fn exclude(&mut self, rect: &LogicalRect<Au>, side: FloatSide) {
        // Negative margins can make the margin box empty; it then excludes nothing.
        let block_start = rect.start_corner.block;
        let block_end = block_start + rect.size.block.max(Au::zero());
        let edge = match side {
            FloatSide::InlineStart => rect.start_corner.inline + rect.size.inline.max(Au::zero()),
            FloatSide::InlineEnd => rect.start_corner.inline,
        };

        let clear_position = match side {
            FloatSide::InlineStart => &mut self.clear_inline_start_position,
            FloatSide::InlineEnd => &mut self.clear_inline_end_position,
        };
        *clear_position = Some(clear_position.map_or(block_end, |position| position.max(block_end)));
        self.ceiling_from_floats = self.ceiling_from_floats.max(block_start);
        self.bands.narrow(block_start..block_end, side, edge);
    }

    /// Finds room for an in-flow box that establishes a formatting context, which
    /// may not overlap any float. `object_size` is the smallest margin box the
    /// box can have. Returns the margin box area it may occupy.
    pub fn place_float_avoider(
        &self,
        ceiling: Au,
        object_size: LogicalVec2<Au>,
        walls: &FloatWalls,
    ) -> LogicalRect<Au> {
        let mut block_start = ceiling;
        loop {
            let (crossed, crossed_end) = self.bands.crossed_by(block_start, object_size.block);
            let inline_start = crossed
                .start_edge
                .map_or(walls.inline_start, |edge| edge.max(walls.inline_start));
            // Without floats in the way, an object wider than its container still fits.
            let widest_end = walls
                .inline_end
                .max(walls.inline_start + object_size.inline);
            let inline_end = crossed
                .end_edge
                .map_or(widest_end, |edge| edge.min(widest_end));
            if inline_end - inline_start >= object_size.inline {
                return LogicalRect {
                    start_corner: LogicalVec2 {
                        inline: inline_start,
                        block: block_start,
                    },
                    size: LogicalVec2 {
                        inline: inline_end - inline_start,
                        block: crossed_end - block_start,
                    },
                };
            }
            match self.bands.next_band_start(block_start) {
                Some(next) => block_start = next,
                None => break,
            }
        }

        let block = self.clearance_position(Clear::Both, ceiling);
        LogicalRect {
            start_corner: LogicalVec2 {
                inline: walls.inline_start,
                block,
            },
            size: LogicalVec2 {
                inline: (walls.inline_end - walls.inline_start).max(object_size.inline),
                block: MAX_AU,
            },
        }
    }

    /// Hands paint responsibility for floats that `child` was painting and that
    /// hang out of its block-end edge over to `parent`.
    ///
    /// Only floats registered since `first_index` are considered, that is, the
    /// floats placed while `child` was laid out.
    pub fn transfer_overhanging(
        &mut self,
        first_index: usize,
        child: BoxId,
        child_block_end: Au,
        parent: BoxId,
    ) -> usize {
        let mut transferred = 0;
        for entry in self.entries.iter_mut().skip(first_index) {
            if entry.painter == child && entry.rect.max_block_position() > child_block_end {
                entry.painter = parent;
                transferred += 1;
            }
        }
        transferred
    }

    pub fn painted_by(&self, painter: BoxId) -> impl Iterator<Item = &FloatEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.placed && entry.painter == painter)
    }

    /// Floats in the order hit testing visits them: the last placed float first.
    pub fn hit_test_order(&self) -> impl Iterator<Item = &FloatEntry> + '_ {
        self.entries.iter().rev().filter(|entry| entry.placed)
    }

    /// Forgets the given floats, keeping the placement of every other float.
    pub fn remove_boxes(&mut self, boxes: &FxHashSet<BoxId>) {
        if !self.entries.iter().any(|entry| boxes.contains(&entry.box_id)) {
            return;
        }
        self.entries.retain(|entry| !boxes.contains(&entry.box_id));
        self.bands = FloatBands::new();
        self.ceiling_from_floats = MIN_AU;
        self.clear_inline_start_position = None;
        self.clear_inline_end_position = None;
        let placed: Vec<(LogicalRect<Au>, FloatSide)> = self
            .entries
            .iter()
            .filter(|entry| entry.placed)
            .map(|entry| (entry.rect, entry.side))
            .collect();
        for (rect, side) in placed {
            self.exclude(&rect, side);
        }
    }
}

/// A stretch of the block axis crossed by the same floats. It ends where the
/// next band starts.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FloatBand {
    block_start: Au,
    /// The furthest inline-end margin edge of the inline-start floats in the band.
    /// `None` when there are none, which is not the same as a zero-width float.
    start_edge: Option<Au>,
    /// The closest inline-start margin edge of the inline-end floats in the band.
    end_edge: Option<Au>,
}

impl FloatBand {
    fn open(block_start: Au) -> Self {
        FloatBand {
            block_start,
            start_edge: None,
            end_edge: None,
        }
    }

    fn narrow(&mut self, side: FloatSide, edge: Au) {
        match side {
            FloatSide::InlineStart => {
                self.start_edge = Some(self.start_edge.map_or(edge, |old| old.max(edge)))
            },
            FloatSide::InlineEnd => {
                self.end_edge = Some(self.end_edge.map_or(edge, |old| old.min(edge)))
            },
        }
    }

    /// The edges left by the floats of both bands.
    fn merge(mut self, other: &FloatBand) -> Self {
        if let Some(edge) = other.start_edge {
            self.narrow(FloatSide::InlineStart, edge);
        }
        if let Some(edge) = other.end_edge {
            self.narrow(FloatSide::InlineEnd, edge);
        }
        self
    }

    /// Whether a new float fits between the floats of this band, following rules 3 and 7
    /// of CSS 2.1 § 9.5.1.
    fn fits_float(&self, object: &PlacementInfo, walls: &FloatWalls) -> bool {
        let width = object.size.inline;
        match object.side {
            FloatSide::InlineStart => {
                let start = self
                    .start_edge
                    .map_or(walls.inline_start, |edge| edge.max(walls.inline_start));
                // Only the first float on a line may stick out of the containing block.
                if self.start_edge.is_some() && start + width > walls.inline_end {
                    return false;
                }
                self.end_edge.is_none_or(|end| width <= end - start)
            },
            FloatSide::InlineEnd => {
                let end = self
                    .end_edge
                    .map_or(walls.inline_end, |edge| edge.min(walls.inline_end));
                if self.end_edge.is_some() && end - width < walls.inline_start {
                    return false;
                }
                self.start_edge.is_none_or(|start| width <= end - start)
            },
        }
    }
}

/// The float bands of a formatting context, sorted by block start. The first
/// band starts at `MIN_AU` so every position falls in some band.
///
/// The list is shared between a registry and its checkpoints and copied on
/// the first write after a checkpoint. Lookups are binary searches.
#[derive(Clone, Debug)]
struct FloatBands(Arc<Vec<FloatBand>>);

impl FloatBands {
    fn new() -> Self {
        FloatBands(Arc::new(vec![FloatBand::open(MIN_AU)]))
    }

    /// The index of the band containing `position`.
    fn index_at(&self, position: Au) -> usize {
        self.0
            .partition_point(|band| band.block_start <= position)
            .saturating_sub(1)
    }

    fn end_of(&self, index: usize) -> Au {
        self.0.get(index + 1).map_or(MAX_AU, |band| band.block_start)
    }

    fn next_band_start(&self, position: Au) -> Option<Au> {
        self.0
            .get(self.index_at(position) + 1)
            .map(|band| band.block_start)
    }

    /// The merged edges of every band a box of `block_size` starting at `block_start`
    /// crosses, and the end of the last of them.
    fn crossed_by(&self, block_start: Au, block_size: Au) -> (FloatBand, Au) {
        let block_end = block_start + block_size.max(Au::zero());
        let mut index = self.index_at(block_start);
        let mut crossed = FloatBand::open(block_start).merge(&self.0[index]);
        while self.end_of(index) < block_end {
            index += 1;
            crossed = crossed.merge(&self.0[index]);
        }
        (crossed, self.end_of(index))
    }

    /// Narrows every band over `block_range` by a float on `side` whose
    /// margin edge facing the content is `edge`.
    fn narrow(&mut self, block_range: Range<Au>, side: FloatSide, edge: Au) {
        if block_range.start >= block_range.end {
            return;
        }
        let bands = Arc::make_mut(&mut self.0);
        let first = split_band_at(bands, block_range.start);
        let last = split_band_at(bands, block_range.end);
        for band in &mut bands[first..last] {
            band.narrow(side, edge);
        }
    }
}

/// Makes a band start exactly at `position` and returns its index.
fn split_band_at(bands: &mut Vec<FloatBand>, position: Au) -> usize {
    let index = bands
        .partition_point(|band| band.block_start <= position)
        .saturating_sub(1);
    if bands[index].block_start == position {
        return index;
    }
    let band = FloatBand {
        block_start: position,
        ..bands[index]
    };
    bands.insert(index + 1, band);
    index + 1
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::box_tree::BoxTree;
    use crate::style::BoxStyle;

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn walls(inline_size: i32) -> FloatWalls {
        FloatWalls {
            inline_start: Au::zero(),
            inline_end: px(inline_size),
        }
    }

    fn float(inline_size: i32, block_size: i32, side: FloatSide) -> PlacementInfo {
        PlacementInfo {
            size: LogicalVec2 {
                inline: px(inline_size),
                block: px(block_size),
            },
            side,
            clear: Clear::None,
        }
    }

    fn ids(count: usize) -> (BoxTree, Vec<BoxId>) {
        let mut tree = BoxTree::new(BoxStyle::default());
        let ids = (0..count)
            .map(|_| tree.create_box(BoxStyle::default()))
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_bands_split_and_merge() {
        let mut bands = FloatBands::new();
        bands.narrow(px(10)..px(30), FloatSide::InlineStart, px(5));
        bands.narrow(px(20)..px(40), FloatSide::InlineEnd, px(90));
        let starts: Vec<Au> = bands.0.iter().map(|band| band.block_start).collect();
        assert_eq!(starts, vec![MIN_AU, px(10), px(20), px(30), px(40)]);

        let checkpoint = bands.clone();
        bands.narrow(px(0)..px(50), FloatSide::InlineStart, px(8));
        assert_eq!(checkpoint.0.len(), 5);
        assert_eq!(bands.0[bands.index_at(px(15))].start_edge, Some(px(8)));

        let (crossed, end) = checkpoint.crossed_by(px(15), px(10));
        assert_eq!(crossed.start_edge, Some(px(5)));
        assert_eq!(crossed.end_edge, Some(px(90)));
        assert_eq!(end, px(30));
        assert_eq!(checkpoint.next_band_start(px(40)), None);
        assert_eq!(checkpoint.next_band_start(px(25)), Some(px(30)));
    }

    #[test]
    fn test_floats_stack_side_by_side_then_wrap() {
        let (tree, ids) = ids(3);
        let mut registry = FloatRegistry::new();
        let walls = walls(250);
        let root = tree.root();

        let info = float(100, 50, FloatSide::InlineStart);
        let index = registry.insert(ids[0], FloatSide::InlineStart, root);
        let first = registry.place(index, &info, Au::zero(), &walls);
        assert_eq!(first.start_corner, LogicalVec2::zero());

        let index = registry.insert(ids[1], FloatSide::InlineStart, root);
        let second = registry.place(index, &info, Au::zero(), &walls);
        assert_eq!(second.start_corner.inline, px(100));
        assert_eq!(second.start_corner.block, Au::zero());

        // No room for a third one beside the first two.
        let index = registry.insert(ids[2], FloatSide::InlineStart, root);
        let third = registry.place(index, &info, Au::zero(), &walls);
        assert_eq!(third.start_corner.inline, Au::zero());
        assert_eq!(third.start_corner.block, px(50));

        assert_eq!(registry.lowest_bottom(Clear::InlineStart), Some(px(100)));
        assert_eq!(registry.lowest_bottom(Clear::InlineEnd), None);
        let order: Vec<BoxId> = registry.hit_test_order().map(|entry| entry.box_id).collect();
        assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_opposite_floats_advance_to_nearest_band_edge() {
        let (tree, ids) = ids(3);
        let mut registry = FloatRegistry::new();
        let walls = walls(200);
        let root = tree.root();

        let index = registry.insert(ids[0], FloatSide::InlineStart, root);
        registry.place(
            index,
            &float(120, 80, FloatSide::InlineStart),
            Au::zero(),
            &walls,
        );
        let index = registry.insert(ids[1], FloatSide::InlineEnd, root);
        let end = registry.place(index, &float(60, 30, FloatSide::InlineEnd), Au::zero(), &walls);
        assert_eq!(end.start_corner.inline, px(140));

        // Too wide for the 20px gap; the inline-end float ends first, at 30.
        let index = registry.insert(ids[2], FloatSide::InlineEnd, root);
        let wide = registry.place(index, &float(70, 10, FloatSide::InlineEnd), Au::zero(), &walls);
        assert_eq!(wide.start_corner.block, px(30));
        assert_eq!(wide.start_corner.inline, px(130));
    }

    #[test]
    fn test_rollback_restores_state() {
        let (tree, ids) = ids(2);
        let mut registry = FloatRegistry::new();
        let walls = walls(200);
        let info = float(50, 50, FloatSide::InlineStart);

        let index = registry.insert(ids[0], FloatSide::InlineStart, tree.root());
        registry.place(index, &info, Au::zero(), &walls);
        let checkpoint = registry.checkpoint();

        let index = registry.insert(ids[1], FloatSide::InlineStart, tree.root());
        registry.place(index, &info, px(100), &walls);
        assert_eq!(registry.lowest_bottom(Clear::Both), Some(px(150)));

        registry.rollback(&checkpoint);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lowest_bottom(Clear::Both), Some(px(50)));
        assert_eq!(
            registry.place_object(&info, Au::zero(), &walls).inline,
            px(50)
        );
    }

    #[test]
    fn test_float_avoider_placement() {
        let (tree, ids) = ids(1);
        let mut registry = FloatRegistry::new();
        let walls = walls(300);
        let index = registry.insert(ids[0], FloatSide::InlineStart, tree.root());
        registry.place(
            index,
            &float(100, 50, FloatSide::InlineStart),
            Au::zero(),
            &walls,
        );

        let beside = registry.place_float_avoider(
            Au::zero(),
            LogicalVec2 {
                inline: px(150),
                block: px(20),
            },
            &walls,
        );
        assert_eq!(beside.start_corner.inline, px(100));
        assert_eq!(beside.start_corner.block, Au::zero());
        assert_eq!(beside.size.inline, px(200));

        let below = registry.place_float_avoider(
            Au::zero(),
            LogicalVec2 {
                inline: px(250),
                block: px(20),
            },
            &walls,
        );
        assert_eq!(below.start_corner.block, px(50));
        assert_eq!(below.size.inline, px(300));
    }

    #[test]
    fn test_transfer_and_removal() {
        let (tree, ids) = ids(3);
        let (child, parent) = (ids[1], ids[2]);
        let mut registry = FloatRegistry::new();
        let walls = walls(300);
        let index = registry.insert(ids[0], FloatSide::InlineStart, child);
        registry.place(
            index,
            &float(100, 50, FloatSide::InlineStart),
            Au::zero(),
            &walls,
        );
        assert_eq!(registry.transfer_overhanging(0, child, px(60), parent), 0);
        assert_eq!(registry.transfer_overhanging(0, child, px(20), parent), 1);
        assert_eq!(registry.painted_by(parent).count(), 1);
        assert_eq!(registry.painted_by(child).count(), 0);

        let mut removed = FxHashSet::default();
        removed.insert(ids[0]);
        registry.remove_boxes(&removed);
        assert!(registry.is_empty());
        assert_eq!(registry.lowest_bottom(Clear::Both), None);
        assert_eq!(
            registry
                .place_object(&float(10, 10, FloatSide::InlineStart), Au::zero(), &walls)
                .inline,
            Au::zero()
        );
        let _ = tree;
    }
}
