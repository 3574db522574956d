/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Overflow areas, computed from final geometry after layout.

use app_units::Au;
use rustc_hash::FxHashMap;

use crate::box_tree::{BoxId, BoxTree, Capabilities};
use crate::geom::{LogicalRect, LogicalVec2};

/// <https://drafts.csswg.org/css-overflow-3/#overflow-regions>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverflowAreas {
    /// The scrollable overflow rectangle, relative to the box's own border box.
    pub scrollable: LogicalRect<Au>,
    /// The padding box of a box that clips its overflow, which is the area the
    /// scrollable overflow is scrolled through.
    pub client: Option<LogicalRect<Au>>,
}

/// The part of a child's overflow that is visible from its parent.
fn contribution(tree: &BoxTree, child: BoxId, offset: LogicalVec2<Au>) -> LogicalRect<Au> {
    let node = &tree[child];
    let rect = if node.capabilities.contains(Capabilities::CLIPS_OVERFLOW) {
        LogicalRect::from_origin_and_size(LogicalVec2::zero(), node.geometry.border_box.size)
    } else {
        node.overflow.scrollable
    };
    rect.translate(offset)
}

/// Computes the overflow areas of every box, children before their parents.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "overflow::compute", skip_all, level = "trace")
)]
pub(crate) fn compute(tree: &mut BoxTree) {
    let order = tree.subtree(tree.root());

    let mut painted_floats: FxHashMap<BoxId, Vec<BoxId>> = FxHashMap::default();
    for id in &order {
        if let Some(registry) = tree[*id].float_registry.as_ref() {
            for entry in registry.entries().iter().filter(|entry| entry.placed) {
                painted_floats
                    .entry(entry.painter)
                    .or_default()
                    .push(entry.box_id);
            }
        }
    }

    for &id in order.iter().rev() {
        let node = &tree[id];
        if !node.is_displayed() {
            tree[id].overflow = OverflowAreas::default();
            continue;
        }

        let border_box =
            LogicalRect::from_origin_and_size(LogicalVec2::zero(), node.geometry.border_box.size);
        let mut scrollable = border_box;

        for child in node
            .children
            .iter()
            .copied()
            .filter(|child| tree[*child].is_in_flow())
        {
            let geometry = &tree[child].geometry;
            let offset = geometry.border_box.start_corner + geometry.relative_offset;
            scrollable = scrollable.union(&contribution(tree, child, offset));
        }

        for float in painted_floats.get(&id).into_iter().flatten() {
            if tree.contains(*float) {
                let offset = tree.offset_in_ancestor(*float, id) + tree[*float].geometry.relative_offset;
                scrollable = scrollable.union(&contribution(tree, *float, offset));
            }
        }

        if let Some(registry) = node.positioned_registry.as_ref() {
            for positioned in registry.iter().filter(|positioned| tree.contains(*positioned)) {
                let offset = tree.offset_in_ancestor(positioned, id) +
                    tree[positioned].geometry.relative_offset;
                scrollable = scrollable.union(&contribution(tree, positioned, offset));
            }
        }

        let client = node
            .capabilities
            .contains(Capabilities::CLIPS_OVERFLOW)
            .then(|| node.geometry.padding_box());
        tree[id].overflow = OverflowAreas { scrollable, client };
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::LayoutContext;
    use crate::geom::LogicalSides;
    use crate::options::LayoutOptions;
    use crate::style::{BoxStyle, Float, Overflow, Position, Size};

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn sized(inline_size: i32, block_size: i32) -> BoxStyle {
        BoxStyle {
            inline_size: Size::px(inline_size),
            block_size: Size::px(block_size),
            ..BoxStyle::default()
        }
    }

    fn layout(tree: &mut BoxTree) {
        tree.layout(&LayoutContext::new(LayoutOptions::default()))
            .unwrap();
    }

    #[test]
    fn test_overflow_of_children_and_clipping() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let clipping = tree.create_box(BoxStyle {
            overflow: Overflow::Hidden,
            border: LogicalSides::uniform(px(2)),
            ..sized(100, 50)
        });
        let tall = tree.create_box(sized(300, 200));
        tree.append_child(root, clipping).unwrap();
        tree.append_child(clipping, tall).unwrap();
        layout(&mut tree);

        let overflow = tree.get(clipping).unwrap().overflow();
        assert_eq!(overflow.scrollable.size.inline, px(302));
        assert_eq!(overflow.scrollable.size.block, px(202));
        assert_eq!(
            overflow.client,
            Some(LogicalRect::from_origin_and_size(
                LogicalVec2 {
                    inline: px(2),
                    block: px(2)
                },
                LogicalVec2 {
                    inline: px(100),
                    block: px(50)
                },
            ))
        );

        // A clipping child only contributes its border box.
        let root_overflow = tree.get(root).unwrap().overflow();
        assert_eq!(root_overflow.scrollable.size.block, px(54));
        assert_eq!(root_overflow.client, None);
    }

    #[test]
    fn test_overflow_includes_floats_and_positioned_boxes() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let container = tree.create_box(BoxStyle {
            position: Position::Relative,
            ..sized(200, 10)
        });
        let float = tree.create_box(BoxStyle {
            float: Float::Left,
            ..sized(50, 80)
        });
        let positioned = tree.create_box(BoxStyle {
            position: Position::Absolute,
            offsets: LogicalSides {
                inline_start: Size::px(250),
                inline_end: Size::Auto,
                block_start: Size::px(0),
                block_end: Size::Auto,
            },
            ..sized(20, 20)
        });
        tree.append_child(root, container).unwrap();
        tree.append_child(container, float).unwrap();
        tree.append_child(container, positioned).unwrap();
        layout(&mut tree);

        let overflow = tree.get(container).unwrap().overflow();
        assert_eq!(overflow.scrollable.size.block, px(80));
        assert_eq!(overflow.scrollable.size.inline, px(270));
    }
}
