/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The output of layout, as handed to painting and hit testing.

use app_units::Au;

use crate::box_tree::{BoxId, BoxTree};
use crate::geom::{LogicalRect, LogicalVec2, PhysicalRect};

/// The final geometry of one box.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub box_id: BoxId,
    /// The border box, relative to the border box of the box it is positioned
    /// against: its containing block for positioned boxes, its parent otherwise.
    pub border_box: LogicalRect<Au>,
    /// `border_box` in the physical coordinates of the same box.
    pub physical_border_box: PhysicalRect<Au>,
    /// The visual offset of a relatively positioned box. Not included in `border_box`.
    pub relative_offset: LogicalVec2<Au>,
    /// The floats this box paints, in placement order.
    pub painted_floats: Vec<BoxId>,
    /// Relative to `border_box`.
    pub scrollable_overflow: LogicalRect<Au>,
    /// The padding box of a box that clips its overflow.
    pub client_rect: Option<LogicalRect<Au>>,
    /// The space inserted before the box to move it to the next fragmentainer.
    pub pagination_strut: Au,
}

/// The fragments of a whole tree, comparable so that layout runs can be
/// checked for idempotence.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSnapshot(pub Vec<Fragment>);

impl BoxTree {
    /// The fragments of every displayed box, in tree order.
    pub fn fragments(&self) -> Vec<Fragment> {
        let root = self.root();
        let writing_mode = self[root].style.writing_mode;
        let root_margin_box_size = self[root]
            .geometry
            .border_box
            .inflate(&self[root].geometry.margin)
            .size
            .to_physical_size(writing_mode);

        let mut fragments = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self[id];
            if !node.is_displayed() {
                continue;
            }
            let geometry = &node.geometry;
            let container_size = match self.offset_parent(id) {
                Some(parent) => self[parent]
                    .geometry
                    .border_box
                    .size
                    .to_physical_size(writing_mode),
                None => root_margin_box_size,
            };
            fragments.push(Fragment {
                box_id: id,
                border_box: geometry.border_box,
                physical_border_box: geometry.border_box.to_physical(
                    writing_mode,
                    geometry.direction,
                    container_size,
                ),
                relative_offset: geometry.relative_offset,
                painted_floats: self.floats_painted_by(id).unwrap_or_default(),
                scrollable_overflow: node.overflow.scrollable,
                client_rect: node.overflow.client,
                pagination_strut: geometry.pagination_strut,
            });
            stack.extend(node.children.iter().rev().copied());
        }
        fragments
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot(self.fragments())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::LayoutContext;
    use crate::geom::PhysicalPoint;
    use crate::geom::PhysicalSize;
    use crate::options::LayoutOptions;
    use crate::style::{BoxStyle, Direction, Display, Size, WritingMode};

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn fragment_for(fragments: &[Fragment], id: BoxId) -> &Fragment {
        fragments
            .iter()
            .find(|fragment| fragment.box_id == id)
            .unwrap()
    }

    #[test]
    fn test_right_to_left_physical_rect() {
        let mut tree = BoxTree::new(BoxStyle {
            direction: Direction::Rtl,
            ..BoxStyle::default()
        });
        let root = tree.root();
        let child = tree.create_box(BoxStyle {
            inline_size: Size::px(100),
            block_size: Size::px(30),
            ..BoxStyle::default()
        });
        let hidden = tree.create_box(BoxStyle {
            display: Display::None,
            ..BoxStyle::default()
        });
        tree.append_child(root, child).unwrap();
        tree.append_child(root, hidden).unwrap();
        tree.layout(&LayoutContext::new(LayoutOptions::default()))
            .unwrap();

        let fragments = tree.fragments();
        assert_eq!(fragments.len(), 2);
        let fragment = fragment_for(&fragments, child);
        assert_eq!(
            fragment.physical_border_box,
            PhysicalRect::new(PhysicalPoint::new(px(700), px(0)), PhysicalSize::new(px(100), px(30)))
        );
    }

    #[test]
    fn test_vertical_root_swaps_axes() {
        let mut tree = BoxTree::new(BoxStyle {
            writing_mode: WritingMode::VerticalLr,
            ..BoxStyle::default()
        });
        let root = tree.root();
        let child = tree.create_box(BoxStyle {
            block_size: Size::px(40),
            ..BoxStyle::default()
        });
        tree.append_child(root, child).unwrap();
        tree.layout(&LayoutContext::new(LayoutOptions::default()))
            .unwrap();

        let fragments = tree.fragments();
        // The inline axis is vertical, so the child is as tall as the viewport.
        assert_eq!(
            fragment_for(&fragments, child).physical_border_box.size,
            PhysicalSize::new(px(40), px(600))
        );
    }

    #[test]
    fn test_snapshot_is_stable_across_relayout() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let child = tree.create_box(BoxStyle {
            block_size: Size::px(40),
            ..BoxStyle::default()
        });
        tree.append_child(root, child).unwrap();
        let context = LayoutContext::new(LayoutOptions::default());
        tree.layout(&context).unwrap();
        let first = tree.snapshot();

        tree.layout(&context).unwrap();
        assert_eq!(tree.snapshot(), first);
        tree.mark_needs_layout(child).unwrap();
        tree.layout(&context).unwrap();
        assert_eq!(tree.snapshot(), first);
    }
}
