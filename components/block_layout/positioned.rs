/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Absolutely and fixed positioned boxes.
//!
//! Positioned boxes are found during the in-flow layout of their tree parent,
//! which records their static position and registers them with their containing
//! block. Once the containing block knows its size, it lays them out as
//! independent formatting contexts against its padding box.
//!
//! See CSS 2.1 § 10.3.7 and § 10.6.4.

use app_units::Au;
use euclid::num::Zero;
use log::debug;
use rustc_hash::FxHashSet;

use crate::box_tree::{BoxContents, BoxId, BoxTree, Capabilities};
use crate::context::{LayoutContext, LayoutInput};
use crate::error::invariant_violation;
use crate::flow;
use crate::geom::{LogicalSides, LogicalVec2};
use crate::sizing;
use crate::style::{BoxStyle, Position, Size};

/// The positioned descendants of a box that contains positioned boxes, in the
/// order they were found.
#[derive(Clone, Debug, Default)]
pub(crate) struct PositionedRegistry {
    boxes: Vec<BoxId>,
}

impl PositionedRegistry {
    pub fn register(&mut self, id: BoxId) {
        if !self.boxes.contains(&id) {
            self.boxes.push(id);
        }
    }

    pub fn remove_boxes(&mut self, boxes: &FxHashSet<BoxId>) {
        self.boxes.retain(|id| !boxes.contains(id));
    }

    pub fn get(&self, index: usize) -> Option<BoxId> {
        self.boxes.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.boxes.iter().copied()
    }
}

/// The box that lays out the positioned box `id`.
pub(crate) fn containing_block_for(tree: &BoxTree, id: BoxId) -> BoxId {
    let root = tree.root();
    if tree[id].style.position == Position::Fixed {
        return root;
    }
    let mut current = tree[id].parent;
    while let Some(ancestor) = current {
        if tree[ancestor]
            .capabilities
            .contains(Capabilities::CONTAINS_POSITIONED)
        {
            return ancestor;
        }
        current = tree[ancestor].parent;
    }
    root
}

/// Registers a positioned box with its containing block.
pub(crate) fn register(tree: &mut BoxTree, id: BoxId) {
    let containing_block = containing_block_for(tree, id);
    match tree[containing_block].positioned_registry.as_mut() {
        Some(registry) => registry.register(id),
        None => {
            return invariant_violation(
                format_args!(
                    "{id:?} registered with {containing_block:?}, which doesn't contain positioned boxes"
                ),
                (),
            );
        },
    }
    tree[id].containing_block = Some(containing_block);
}

/// Registers again the positioned descendants of a reused subtree whose
/// containing block is outside of it. Their containing block cleared its
/// registry when its own layout began.
pub(crate) fn reregister_escaping(tree: &mut BoxTree, subtree_root: BoxId) {
    for id in tree.subtree(subtree_root) {
        if id == subtree_root ||
            !tree[id].is_displayed() ||
            !tree[id].is_out_of_flow_positioned()
        {
            continue;
        }
        let containing_block = containing_block_for(tree, id);
        if !tree.is_inclusive_ancestor(subtree_root, containing_block) {
            register(tree, id);
        }
    }
}

/// Lays out every box registered with `containing_block`, including the ones
/// registered while doing so.
pub(crate) fn layout_positioned_descendants(
    tree: &mut BoxTree,
    context: &LayoutContext,
    containing_block: BoxId,
) {
    let mut index = 0;
    while let Some(id) = tree[containing_block]
        .positioned_registry
        .as_ref()
        .and_then(|registry| registry.get(index))
    {
        index += 1;
        if tree.contains(id) {
            layout_positioned_box(tree, context, containing_block, id);
        }
    }
}

/// The inputs of the constraint equation in one axis, relative to the padding
/// box of the containing block. `None` stands for `auto`.
#[derive(Clone, Copy, Debug)]
struct AxisConstraints {
    containing_size: Au,
    /// The margin-box start the box would have had in flow.
    static_position: Au,
    start: Option<Au>,
    end: Option<Au>,
    margin_start: Option<Au>,
    margin_end: Option<Au>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AxisSolution {
    border_box_start: Au,
    margin_start: Au,
    margin_end: Au,
}

impl AxisConstraints {
    fn new(
        containing_size: Au,
        static_position: Au,
        insets: (Option<Au>, Option<Au>),
        margins: (&Size, &Size),
        percentage_basis: Au,
    ) -> Self {
        AxisConstraints {
            containing_size,
            static_position,
            start: insets.0,
            end: insets.1,
            margin_start: margins.0.resolve(percentage_basis),
            margin_end: margins.1.resolve(percentage_basis),
        }
    }

    /// The space left for the margin box when its size comes from both insets.
    fn stretch_size(&self) -> Option<Au> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(
                self.containing_size -
                    start -
                    end -
                    self.margin_start.unwrap_or_else(Au::zero) -
                    self.margin_end.unwrap_or_else(Au::zero),
            ),
            _ => None,
        }
    }

    /// The space available to a shrink-to-fit box.
    fn available_size(&self) -> Au {
        let start = self.start.unwrap_or(self.static_position);
        (self.containing_size - start - self.end.unwrap_or_else(Au::zero)).max(Au::zero())
    }

    /// Positions a border box of `size`. Negative free space in the inline axis
    /// goes to the end margin when both margins are `auto`.
    fn solve(&self, size: Au, is_inline_axis: bool) -> AxisSolution {
        let (start, margin_start, margin_end) = match (self.start, self.end) {
            (None, None) => {
                let margin_start = self.margin_start.unwrap_or_else(Au::zero);
                (
                    self.static_position,
                    margin_start,
                    self.margin_end.unwrap_or_else(Au::zero),
                )
            },
            (Some(start), None) => (
                start,
                self.margin_start.unwrap_or_else(Au::zero),
                self.margin_end.unwrap_or_else(Au::zero),
            ),
            (None, Some(end)) => {
                let margin_start = self.margin_start.unwrap_or_else(Au::zero);
                let margin_end = self.margin_end.unwrap_or_else(Au::zero);
                (
                    self.containing_size - end - margin_end - size - margin_start,
                    margin_start,
                    margin_end,
                )
            },
            (Some(start), Some(end)) => {
                let free_space = self.containing_size - start - end - size;
                let (margin_start, margin_end) = match (self.margin_start, self.margin_end) {
                    (None, None) => {
                        if is_inline_axis && free_space < Au::zero() {
                            (Au::zero(), free_space)
                        } else {
                            let half = Au(free_space.0 / 2);
                            (half, free_space - half)
                        }
                    },
                    (None, Some(margin_end)) => (free_space - margin_end, margin_end),
                    (Some(margin_start), None) => (margin_start, free_space - margin_start),
                    // Over-constrained: the end inset gives way.
                    (Some(margin_start), Some(margin_end)) => (margin_start, margin_end),
                };
                (start, margin_start, margin_end)
            },
        };
        AxisSolution {
            border_box_start: start + margin_start,
            margin_start,
            margin_end,
        }
    }
}

fn insets(style: &BoxStyle, containing_size: LogicalVec2<Au>) -> LogicalSides<Option<Au>> {
    LogicalSides {
        inline_start: style.offsets.inline_start.resolve(containing_size.inline),
        inline_end: style.offsets.inline_end.resolve(containing_size.inline),
        block_start: style.offsets.block_start.resolve(containing_size.block),
        block_end: style.offsets.block_end.resolve(containing_size.block),
    }
}

/// Lays out one positioned box against the padding box of its containing block.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "positioned::layout_positioned_box", skip_all, level = "trace")
)]
fn layout_positioned_box(
    tree: &mut BoxTree,
    context: &LayoutContext,
    containing_block: BoxId,
    id: BoxId,
) {
    let padding_box = tree[containing_block].geometry.padding_box();
    let containing_size = padding_box.size;
    let static_position = match tree[id].parent {
        Some(parent) => tree.offset_in_ancestor(parent, containing_block),
        None => LogicalVec2::zero(),
    } + tree[id].static_position -
        padding_box.start_corner;

    let style = tree[id].style.clone();
    let insets = insets(&style, containing_size);
    let padding_border = sizing::padding_border(&style, containing_size.inline);

    let inline_axis = AxisConstraints::new(
        containing_size.inline,
        static_position.inline,
        (insets.inline_start, insets.inline_end),
        (&style.margin.inline_start, &style.margin.inline_end),
        containing_size.inline,
    );
    let block_axis = AxisConstraints::new(
        containing_size.block,
        static_position.block,
        (insets.block_start, insets.block_end),
        (&style.margin.block_start, &style.margin.block_end),
        containing_size.inline,
    );

    let is_replaced = matches!(tree[id].contents, BoxContents::Replaced(_));
    let content_inline_size = match inline_axis.stretch_size() {
        Some(stretch) if style.inline_size.is_auto() && !is_replaced => sizing::clamp_inline_size(
            &style,
            stretch - padding_border.inline_sum(),
            padding_border.inline_sum(),
            containing_size.inline,
        ),
        _ => sizing::shrink_to_fit_inline_size(
            tree,
            id,
            containing_size.inline,
            inline_axis.available_size(),
        ),
    };
    let block_size_override = match block_axis.stretch_size() {
        Some(stretch) if style.block_size.is_auto() && !is_replaced => {
            Some((stretch - padding_border.block_sum()).max(Au::zero()))
        },
        _ => None,
    };

    let input = LayoutInput {
        containing_inline_size: containing_size.inline,
        containing_block_size: Some(containing_size.block),
        content_inline_size,
        block_size_override,
        fragmentation_offset: None,
    };
    let result = flow::layout_block_level_box(tree, context, id, &input, None);

    let inline = inline_axis.solve(
        content_inline_size + padding_border.inline_sum(),
        true,
    );
    let block = block_axis.solve(result.block_size, false);
    debug!(
        "Positioned {id:?} in {containing_block:?} at ({:?}, {:?})",
        inline.border_box_start, block.border_box_start
    );

    let direction = tree[containing_block].style.direction;
    let geometry = &mut tree[id].geometry;
    geometry.border_box.start_corner = padding_box.start_corner +
        LogicalVec2 {
            inline: inline.border_box_start,
            block: block.border_box_start,
        };
    geometry.margin = LogicalSides {
        inline_start: inline.margin_start,
        inline_end: inline.margin_end,
        block_start: block.margin_start,
        block_end: block.margin_end,
    };
    geometry.direction = direction;
    geometry.pagination_strut = Au::zero();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::options::LayoutOptions;
    use crate::style::LengthPercentage;

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn offsets(
        inline_start: Size,
        inline_end: Size,
        block_start: Size,
        block_end: Size,
    ) -> LogicalSides<Size> {
        LogicalSides {
            inline_start,
            inline_end,
            block_start,
            block_end,
        }
    }

    fn layout(tree: &mut BoxTree) {
        tree.layout(&LayoutContext::new(LayoutOptions::default()))
            .unwrap();
    }

    fn relative_container(tree: &mut BoxTree) -> BoxId {
        let container = tree.create_box(BoxStyle {
            position: Position::Relative,
            inline_size: Size::px(400),
            block_size: Size::px(300),
            padding: LogicalSides::uniform(LengthPercentage::px(10)),
            ..BoxStyle::default()
        });
        let root = tree.root();
        tree.append_child(root, container).unwrap();
        container
    }

    #[test]
    fn test_axis_over_constrained_end_gives_way() {
        let axis = AxisConstraints {
            containing_size: px(100),
            static_position: Au::zero(),
            start: Some(px(10)),
            end: Some(px(10)),
            margin_start: Some(px(5)),
            margin_end: Some(px(5)),
        };
        let solution = axis.solve(px(50), true);
        assert_eq!(solution.border_box_start, px(15));
        assert_eq!(solution.margin_end, px(5));
    }

    #[test]
    fn test_axis_auto_margins() {
        let axis = AxisConstraints {
            containing_size: px(100),
            static_position: Au::zero(),
            start: Some(px(0)),
            end: Some(px(0)),
            margin_start: None,
            margin_end: None,
        };
        assert_eq!(axis.solve(px(40), true).border_box_start, px(30));
        // Too wide: the inline-end margin absorbs the overflow.
        let solution = axis.solve(px(140), true);
        assert_eq!(solution.margin_start, Au::zero());
        assert_eq!(solution.margin_end, px(-40));
        // The block axis splits it.
        assert_eq!(axis.solve(px(140), false).margin_start, px(-20));
    }

    #[test]
    fn test_stretched_between_insets() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let container = relative_container(&mut tree);
        let positioned = tree.create_box(BoxStyle {
            position: Position::Absolute,
            offsets: offsets(Size::px(20), Size::px(30), Size::px(5), Size::px(15)),
            ..BoxStyle::default()
        });
        tree.append_child(container, positioned).unwrap();
        layout(&mut tree);

        let geometry = tree.geometry(positioned).unwrap();
        // The padding box is 420x320 and starts at (0, 0) of the border box.
        assert_eq!(
            geometry.border_box.start_corner,
            LogicalVec2 {
                inline: px(20),
                block: px(5)
            }
        );
        assert_eq!(geometry.border_box.size.inline, px(370));
        assert_eq!(geometry.border_box.size.block, px(300));
        assert_eq!(tree[positioned].containing_block, Some(container));
    }

    #[test]
    fn test_static_position_and_shrink_to_fit() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let container = relative_container(&mut tree);
        let before = tree.create_box(BoxStyle {
            block_size: Size::px(40),
            ..BoxStyle::default()
        });
        let positioned = tree.create_box(BoxStyle {
            position: Position::Absolute,
            ..BoxStyle::default()
        });
        let inner = tree.create_box(BoxStyle {
            inline_size: Size::px(60),
            block_size: Size::px(10),
            ..BoxStyle::default()
        });
        tree.append_child(container, before).unwrap();
        tree.append_child(container, positioned).unwrap();
        tree.append_child(positioned, inner).unwrap();
        layout(&mut tree);

        let geometry = tree.geometry(positioned).unwrap();
        assert_eq!(
            geometry.border_box.start_corner,
            LogicalVec2 {
                inline: px(10),
                block: px(50)
            }
        );
        assert_eq!(geometry.border_box.size.inline, px(60));
        // Positioned boxes don't take space in the flow.
        assert_eq!(tree.geometry(container).unwrap().border_box.size.block, px(320));
    }

    #[test]
    fn test_fixed_registers_with_root() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let container = relative_container(&mut tree);
        let fixed = tree.create_box(BoxStyle {
            position: Position::Fixed,
            offsets: offsets(Size::Auto, Size::px(0), Size::px(0), Size::Auto),
            inline_size: Size::px(50),
            block_size: Size::px(50),
            ..BoxStyle::default()
        });
        tree.append_child(container, fixed).unwrap();
        layout(&mut tree);

        let root = tree.root();
        assert_eq!(tree[fixed].containing_block, Some(root));
        let registry = tree[root].positioned_registry.as_ref().unwrap();
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![fixed]);
        assert_eq!(
            tree.geometry(fixed).unwrap().border_box.start_corner,
            LogicalVec2 {
                inline: px(750),
                block: Au::zero()
            }
        );

        // Reusing the container's layout registers the fixed box again.
        tree.mark_needs_layout(root).unwrap();
        layout(&mut tree);
        let registry = tree[root].positioned_registry.as_ref().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_removed_positioned_box_is_deregistered() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let container = relative_container(&mut tree);
        let positioned = tree.create_box(BoxStyle {
            position: Position::Absolute,
            ..BoxStyle::default()
        });
        tree.append_child(container, positioned).unwrap();
        layout(&mut tree);
        assert!(!tree[container]
            .positioned_registry
            .as_ref()
            .unwrap()
            .is_empty());

        tree.remove(positioned).unwrap();
        assert!(tree[container]
            .positioned_registry
            .as_ref()
            .unwrap()
            .is_empty());
        layout(&mut tree);
    }
}
