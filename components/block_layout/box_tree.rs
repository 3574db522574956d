/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The box tree: every box taking part in block layout, owned by one arena.

use std::fmt::{self, Write};
use std::ops::{Index, IndexMut};

use app_units::Au;
use bitflags::bitflags;
use euclid::num::Zero;
use log::debug;
use rustc_hash::FxHashSet;

use crate::context::LayoutContext;
use crate::error::BoxTreeError;
use crate::float::FloatRegistry;
use crate::flow::{self, CachedLayout};
use crate::geom::{LogicalRect, LogicalSides, LogicalVec2};
use crate::inline::InlineContent;
use crate::overflow::{self, OverflowAreas};
use crate::positioned::PositionedRegistry;
use crate::style::{BoxStyle, Direction, Display, Position};

/// A handle to a box in a [`BoxTree`].
///
/// Ids of removed boxes are never handed out again with the same generation,
/// so a stale id is detected rather than silently pointing at another box.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BoxId {
    index: u32,
    generation: u32,
}

/// Why a box that would otherwise be an ordinary block establishes an
/// independent formatting context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlowRootReason {
    FlowRoot,
    InlineBlock,
    ScrollContainer,
    FlexOrGridItem,
    TableCaption,
    /// The box has a writing mode different from its parent.
    WritingModeRoot,
    Containment,
    /// The box is positioned by its container's excluded-child hook.
    Excluded,
}

/// What part a box plays in block layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoxRole {
    Root,
    Block,
    Float,
    OutOfFlow,
    FlowRoot(FlowRootReason),
    Multicol,
    TableCell,
    Replaced,
}

bitflags! {
    /// Layout predicates derived from a box's role and style, cached on the box.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Capabilities: u16 {
        /// Margins don't collapse through the box and floats don't cross its edges.
        const ESTABLISHES_FORMATTING_CONTEXT = 1 << 0;
        /// The box is in flow and may not overlap floats of its parent's formatting context.
        const AVOIDS_FLOATS = 1 << 1;
        const FLOATING = 1 << 2;
        const OUT_OF_FLOW = 1 << 3;
        /// The box is the containing block of absolutely positioned descendants.
        const CONTAINS_POSITIONED = 1 << 4;
        /// The box paints its own descendants, including floats that overhang it.
        const PAINT_LAYER = 1 << 5;
        const CLIPS_OVERFLOW = 1 << 6;
        /// The box is never broken across fragmentainers.
        const MONOLITHIC = 1 << 7;
        /// Legacy quirky margins of children at the box's edges may be ignored.
        const QUIRK_CONTAINER = 1 << 8;
    }
}

impl BoxRole {
    fn compute(
        style: &BoxStyle,
        contents: &BoxContents,
        is_root: bool,
        parent_style: Option<&BoxStyle>,
        is_excluded: bool,
    ) -> Self {
        if is_root {
            return BoxRole::Root;
        }
        if style.is_out_of_flow_positioned() {
            return BoxRole::OutOfFlow;
        }
        if style.is_floating() {
            return BoxRole::Float;
        }
        if matches!(contents, BoxContents::Replaced(_)) {
            return BoxRole::Replaced;
        }
        if style.display == Display::TableCell {
            return BoxRole::TableCell;
        }
        if style.specifies_columns() {
            return BoxRole::Multicol;
        }
        let reason = match style.display {
            Display::FlowRoot => Some(FlowRootReason::FlowRoot),
            Display::InlineBlock => Some(FlowRootReason::InlineBlock),
            Display::FlexItem | Display::GridItem => Some(FlowRootReason::FlexOrGridItem),
            Display::TableCaption => Some(FlowRootReason::TableCaption),
            // Only scroll containers start a formatting context. `overflow: clip` clips
            // without one, so its floats and margins still interact with the outside.
            _ if style.overflow.is_scrollable() => Some(FlowRootReason::ScrollContainer),
            _ if parent_style.is_some_and(|parent| parent.writing_mode != style.writing_mode) => {
                Some(FlowRootReason::WritingModeRoot)
            },
            _ if style.contain_layout || style.contain_paint => Some(FlowRootReason::Containment),
            _ if is_excluded => Some(FlowRootReason::Excluded),
            _ => None,
        };
        match reason {
            Some(reason) => BoxRole::FlowRoot(reason),
            None => BoxRole::Block,
        }
    }

    fn capabilities(self, style: &BoxStyle) -> Capabilities {
        let mut capabilities = Capabilities::empty();
        if self != BoxRole::Block {
            capabilities.insert(Capabilities::ESTABLISHES_FORMATTING_CONTEXT);
        }
        match self {
            BoxRole::Float => capabilities.insert(Capabilities::FLOATING),
            BoxRole::OutOfFlow => capabilities.insert(Capabilities::OUT_OF_FLOW),
            BoxRole::FlowRoot(_) | BoxRole::Multicol | BoxRole::TableCell | BoxRole::Replaced => {
                capabilities.insert(Capabilities::AVOIDS_FLOATS)
            },
            BoxRole::Root | BoxRole::Block => {},
        }

        let is_root = self == BoxRole::Root;
        let positioned = style.position != Position::Static;
        if is_root || positioned {
            capabilities.insert(Capabilities::CONTAINS_POSITIONED);
        }
        if is_root || positioned || style.isolation || style.contain_paint {
            capabilities.insert(Capabilities::PAINT_LAYER);
        }
        if style.overflow.clips() || style.contain_paint {
            capabilities.insert(Capabilities::CLIPS_OVERFLOW);
        }
        if matches!(
            self,
            BoxRole::Replaced |
                BoxRole::FlowRoot(FlowRootReason::ScrollContainer) |
                BoxRole::FlowRoot(FlowRootReason::WritingModeRoot)
        ) || style.position == Position::Fixed
        {
            capabilities.insert(Capabilities::MONOLITHIC);
        }
        if style.is_body || self == BoxRole::TableCell {
            capabilities.insert(Capabilities::QUIRK_CONTAINER);
        }
        capabilities
    }
}

/// What a box contains.
pub enum BoxContents {
    /// Block-level children, laid out by the block layout driver.
    BlockLevelBoxes,
    /// Inline-level content, laid out into lines by the inline collaborator.
    /// Floated and out-of-flow children of the box are placed at the start of the content.
    Inline(Box<dyn InlineContent>),
    /// Replaced content with an intrinsic size and no children.
    Replaced(LogicalVec2<Au>),
}

impl fmt::Debug for BoxContents {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoxContents::BlockLevelBoxes => formatter.write_str("BlockLevelBoxes"),
            BoxContents::Inline(content) => formatter.debug_tuple("Inline").field(content).finish(),
            BoxContents::Replaced(size) => formatter.debug_tuple("Replaced").field(size).finish(),
        }
    }
}

/// Where the excluded-child hook puts the excluded child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExcludedChildPosition {
    /// The start corner of the child's margin box, relative to the container's content box.
    pub offset: LogicalVec2<Au>,
    /// Block space taken at the start of the container's content box, before
    /// any other child.
    pub reserved_block_size: Au,
}

/// Layout logic of a table, flex or grid container that positions one child
/// itself instead of leaving it to the block layout driver.
pub trait ExcludedChildPlacement: fmt::Debug {
    /// `child_size` is the size of the laid out child's margin box.
    fn place(&self, container_inline_size: Au, child_size: LogicalVec2<Au>)
    -> ExcludedChildPosition;
}

/// Puts the excluded child at the block-start edge of the content box,
/// reserving its whole block size, the way a table caption sits on top of its table.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackAtBlockStart;

impl ExcludedChildPlacement for StackAtBlockStart {
    fn place(&self, _: Au, child_size: LogicalVec2<Au>) -> ExcludedChildPosition {
        ExcludedChildPosition {
            offset: LogicalVec2::zero(),
            reserved_block_size: child_size.block.max(Au::zero()),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ExcludedChild {
    pub child: BoxId,
    pub placement: Box<dyn ExcludedChildPlacement>,
}

/// The used geometry of a box after layout.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxGeometry {
    /// The border box, relative to the border box of the box's offset parent:
    /// its containing block for out-of-flow boxes, its parent otherwise.
    pub border_box: LogicalRect<Au>,
    pub margin: LogicalSides<Au>,
    pub border: LogicalSides<Au>,
    pub padding: LogicalSides<Au>,
    /// The visual offset of a relatively positioned box. It does not affect flow.
    pub relative_offset: LogicalVec2<Au>,
    /// The inline base direction of the formatting context the box was placed in.
    pub direction: Direction,
    /// How far the box was pushed down to start in the next fragmentainer.
    pub pagination_strut: Au,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        BoxGeometry {
            border_box: LogicalRect::zero(),
            margin: LogicalSides::zero(),
            border: LogicalSides::zero(),
            padding: LogicalSides::zero(),
            relative_offset: LogicalVec2::zero(),
            direction: Direction::Ltr,
            pagination_strut: Au::zero(),
        }
    }
}

impl BoxGeometry {
    /// The padding box, relative to the border box.
    pub fn padding_box(&self) -> LogicalRect<Au> {
        LogicalRect::from_origin_and_size(LogicalVec2::zero(), self.border_box.size)
            .deflate(&self.border)
    }

    /// The content box, relative to the border box.
    pub fn content_box(&self) -> LogicalRect<Au> {
        self.padding_box().deflate(&self.padding)
    }
}

#[derive(Debug)]
pub struct BoxNode {
    pub(crate) style: BoxStyle,
    pub(crate) role: BoxRole,
    pub(crate) capabilities: Capabilities,
    pub(crate) parent: Option<BoxId>,
    /// All children in document order, in flow or not.
    pub(crate) children: Vec<BoxId>,
    pub(crate) contents: BoxContents,
    pub(crate) excluded: Option<ExcludedChild>,
    pub(crate) needs_layout: bool,
    pub(crate) geometry: BoxGeometry,
    pub(crate) cached: Option<CachedLayout>,
    /// The floats of the formatting context this box establishes, if it does.
    pub(crate) float_registry: Option<FloatRegistry>,
    /// The positioned descendants this box is the containing block of.
    pub(crate) positioned_registry: Option<PositionedRegistry>,
    /// For out-of-flow boxes, the box they are registered with.
    pub(crate) containing_block: Option<BoxId>,
    /// For out-of-flow boxes, the start corner of their hypothetical in-flow
    /// margin box, relative to the parent's border box.
    pub(crate) static_position: LogicalVec2<Au>,
    pub(crate) overflow: OverflowAreas,
}

impl BoxNode {
    fn new(style: BoxStyle) -> Self {
        let role = BoxRole::compute(&style, &BoxContents::BlockLevelBoxes, false, None, false);
        let capabilities = role.capabilities(&style);
        BoxNode {
            style,
            role,
            capabilities,
            parent: None,
            children: Vec::new(),
            contents: BoxContents::BlockLevelBoxes,
            excluded: None,
            needs_layout: true,
            geometry: BoxGeometry::default(),
            cached: None,
            float_registry: None,
            positioned_registry: None,
            containing_block: None,
            static_position: LogicalVec2::zero(),
            overflow: OverflowAreas::default(),
        }
    }

    pub fn style(&self) -> &BoxStyle {
        &self.style
    }

    pub fn role(&self) -> BoxRole {
        self.role
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    pub fn geometry(&self) -> &BoxGeometry {
        &self.geometry
    }

    pub fn overflow(&self) -> &OverflowAreas {
        &self.overflow
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub fn is_floating(&self) -> bool {
        self.capabilities.contains(Capabilities::FLOATING)
    }

    pub fn is_out_of_flow_positioned(&self) -> bool {
        self.capabilities.contains(Capabilities::OUT_OF_FLOW)
    }

    pub fn establishes_new_formatting_context(&self) -> bool {
        self.capabilities
            .contains(Capabilities::ESTABLISHES_FORMATTING_CONTEXT)
    }

    /// Whether the box takes part in layout at all.
    pub(crate) fn is_displayed(&self) -> bool {
        self.style.display != Display::None
    }

    /// Whether the box is laid out by the block layout driver as an in-flow block.
    pub(crate) fn is_in_flow(&self) -> bool {
        self.is_displayed() &&
            !self
                .capabilities
                .intersects(Capabilities::FLOATING | Capabilities::OUT_OF_FLOW)
    }
}

struct Slot {
    generation: u32,
    node: Option<BoxNode>,
}

/// The arena owning every box.
pub struct BoxTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: BoxId,
}

impl Index<BoxId> for BoxTree {
    type Output = BoxNode;

    /// Panics on a stale id. Layout only ever follows ids found in the tree itself.
    fn index(&self, id: BoxId) -> &BoxNode {
        match self.slots.get(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => node,
            _ => panic!("stale box id {id:?}"),
        }
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxNode {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => node,
            _ => panic!("stale box id {id:?}"),
        }
    }
}

impl BoxTree {
    pub fn new(root_style: BoxStyle) -> Self {
        let mut tree = BoxTree {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: BoxId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.create_box(root_style);
        tree.update_capabilities(tree.root);
        tree
    }

    pub fn root(&self) -> BoxId {
        self.root
    }

    /// Creates a box that is not attached to the tree yet.
    pub fn create_box(&mut self, style: BoxStyle) -> BoxId {
        let node = BoxNode::new(style);
        match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                BoxId {
                    index,
                    generation: slot.generation,
                }
            },
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                BoxId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            },
        }
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: BoxId) -> Result<&BoxNode, BoxTreeError> {
        match self.slots.get(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => Ok(node),
            _ => Err(BoxTreeError::StaleBox(id)),
        }
    }

    fn get_mut(&mut self, id: BoxId) -> Result<&mut BoxNode, BoxTreeError> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => Ok(node),
            _ => Err(BoxTreeError::StaleBox(id)),
        }
    }

    pub fn parent(&self, id: BoxId) -> Result<Option<BoxId>, BoxTreeError> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: BoxId) -> Result<&[BoxId], BoxTreeError> {
        Ok(&self.get(id)?.children)
    }

    pub fn style(&self, id: BoxId) -> Result<&BoxStyle, BoxTreeError> {
        Ok(&self.get(id)?.style)
    }

    pub fn geometry(&self, id: BoxId) -> Result<&BoxGeometry, BoxTreeError> {
        Ok(&self.get(id)?.geometry)
    }

    pub fn needs_layout(&self, id: BoxId) -> Result<bool, BoxTreeError> {
        Ok(self.get(id)?.needs_layout)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: BoxId, id: BoxId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).ok().and_then(|node| node.parent);
        }
        false
    }

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already in the tree.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), BoxTreeError> {
        self.insert(parent, child, None)
    }

    /// Inserts `child` into `parent` right before `reference`.
    pub fn insert_before(
        &mut self,
        parent: BoxId,
        child: BoxId,
        reference: BoxId,
    ) -> Result<(), BoxTreeError> {
        self.insert(parent, child, Some(reference))
    }

    fn insert(
        &mut self,
        parent: BoxId,
        child: BoxId,
        reference: Option<BoxId>,
    ) -> Result<(), BoxTreeError> {
        let parent_node = self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(BoxTreeError::DetachRoot);
        }
        if matches!(parent_node.contents, BoxContents::Replaced(_)) {
            return Err(BoxTreeError::NotAContainer(parent));
        }
        if let Some(reference) = reference {
            self.get(reference)?;
            if reference == child || !parent_node.children.contains(&reference) {
                return Err(BoxTreeError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(BoxTreeError::WouldCreateCycle { parent, child });
        }

        if self[child].parent.is_some() {
            self.detach(child);
        }
        let parent_node = &mut self[parent];
        let index = reference
            .and_then(|reference| parent_node.children.iter().position(|id| *id == reference))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, child);
        self[child].parent = Some(parent);
        self.update_capabilities(child);
        self.mark_subtree_needs_layout(child);
        self.mark_ancestors_need_layout(parent);
        Ok(())
    }

    /// Takes the box out of its parent, keeping the subtree alive.
    fn detach(&mut self, id: BoxId) {
        let Some(parent) = self[id].parent else {
            return;
        };
        let subtree = self.subtree(id);
        self.deregister(parent, &subtree);
        let parent_node = &mut self[parent];
        parent_node.children.retain(|child| *child != id);
        if parent_node
            .excluded
            .as_ref()
            .is_some_and(|excluded| excluded.child == id)
        {
            parent_node.excluded = None;
        }
        self[id].parent = None;
        self.mark_ancestors_need_layout(parent);
    }

    /// Removes the box and all of its descendants from the tree. Their ids become stale.
    pub fn remove(&mut self, id: BoxId) -> Result<(), BoxTreeError> {
        self.get(id)?;
        if id == self.root {
            return Err(BoxTreeError::DetachRoot);
        }
        self.detach(id);
        for removed in self.subtree(id) {
            let slot = &mut self.slots[removed.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(removed.index);
        }
        Ok(())
    }

    /// The box and all of its descendants, in tree order.
    pub(crate) fn subtree(&self, id: BoxId) -> Vec<BoxId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self[current].children.iter().rev().copied());
        }
        result
    }

    /// Forgets the given boxes in every float and positioned-descendant registry
    /// from `start` up to the root.
    fn deregister(&mut self, start: BoxId, boxes: &[BoxId]) {
        let set: FxHashSet<BoxId> = boxes.iter().copied().collect();
        let mut current = Some(start);
        while let Some(ancestor) = current {
            let node = &mut self[ancestor];
            if let Some(floats) = node.float_registry.as_mut() {
                floats.remove_boxes(&set);
            }
            if let Some(positioned) = node.positioned_registry.as_mut() {
                positioned.remove_boxes(&set);
            }
            current = node.parent;
        }
        for id in boxes {
            self[*id].containing_block = None;
        }
    }

    pub fn set_style(&mut self, id: BoxId, style: BoxStyle) -> Result<(), BoxTreeError> {
        let node = self.get_mut(id)?;
        let scheme_changed = node.style.position != style.position ||
            node.style.float != style.float ||
            node.style.display != style.display;
        node.style = style;
        if scheme_changed {
            let subtree = self.subtree(id);
            self.deregister(id, &subtree);
        }
        self.update_capabilities(id);
        let children = self[id].children.clone();
        for child in children {
            self.update_capabilities(child);
        }
        self.mark_needs_layout(id)
    }

    /// Makes the box an inline formatting context root for the given content.
    pub fn set_inline_content(
        &mut self,
        id: BoxId,
        content: Box<dyn InlineContent>,
    ) -> Result<(), BoxTreeError> {
        self.get_mut(id)?.contents = BoxContents::Inline(content);
        self.update_capabilities(id);
        self.mark_needs_layout(id)
    }

    /// Makes the box hold replaced content with the given intrinsic size.
    pub fn set_replaced_size(
        &mut self,
        id: BoxId,
        size: LogicalVec2<Au>,
    ) -> Result<(), BoxTreeError> {
        let node = self.get_mut(id)?;
        if !node.children.is_empty() {
            return Err(BoxTreeError::NotAContainer(id));
        }
        node.contents = BoxContents::Replaced(size);
        self.update_capabilities(id);
        self.mark_needs_layout(id)
    }

    /// Hands the placement of `child` over to `placement`. The driver lays it out
    /// as an independent formatting context and skips it in the normal traversal.
    pub fn set_excluded_child(
        &mut self,
        parent: BoxId,
        child: BoxId,
        placement: Box<dyn ExcludedChildPlacement>,
    ) -> Result<(), BoxTreeError> {
        self.get(child)?;
        let node = self.get_mut(parent)?;
        if !node.children.contains(&child) {
            return Err(BoxTreeError::NotAChild { parent, child });
        }
        let previous = node
            .excluded
            .replace(ExcludedChild { child, placement })
            .map(|excluded| excluded.child);
        if let Some(previous) = previous.filter(|previous| *previous != child) {
            if self.contains(previous) {
                self.update_capabilities(previous);
                self.mark_subtree_needs_layout(previous);
            }
        }
        self.update_capabilities(child);
        self.mark_subtree_needs_layout(child);
        self.mark_needs_layout(parent)
    }

    /// Flags the box for layout, along with every ancestor whose layout depends on it.
    pub fn mark_needs_layout(&mut self, id: BoxId) -> Result<(), BoxTreeError> {
        self.get(id)?;
        self.mark_ancestors_need_layout(id);
        Ok(())
    }

    fn mark_ancestors_need_layout(&mut self, id: BoxId) {
        let mut current = Some(id);
        while let Some(ancestor) = current {
            let node = &mut self[ancestor];
            node.needs_layout = true;
            current = node.parent;
        }
    }

    fn mark_subtree_needs_layout(&mut self, id: BoxId) {
        for descendant in self.subtree(id) {
            self[descendant].needs_layout = true;
        }
    }

    fn update_capabilities(&mut self, id: BoxId) {
        let is_root = id == self.root;
        let node = &self[id];
        let (parent_style, is_excluded) = match node.parent {
            Some(parent) => {
                let parent = &self[parent];
                let is_excluded = parent
                    .excluded
                    .as_ref()
                    .is_some_and(|excluded| excluded.child == id);
                (Some(&parent.style), is_excluded)
            },
            None => (None, false),
        };
        let role = BoxRole::compute(
            &node.style,
            &node.contents,
            is_root,
            parent_style,
            is_excluded,
        );
        let capabilities = role.capabilities(&node.style);
        let node = &mut self[id];
        if node.role != role || node.capabilities != capabilities {
            node.needs_layout = true;
        }
        node.role = role;
        node.capabilities = capabilities;
    }

    /// The box that `id` is positioned relative to.
    pub(crate) fn offset_parent(&self, id: BoxId) -> Option<BoxId> {
        let node = &self[id];
        if node.capabilities.contains(Capabilities::OUT_OF_FLOW) {
            node.containing_block.or(node.parent)
        } else {
            node.parent
        }
    }

    /// The position of the border box of `id` relative to the border box of `ancestor`.
    pub(crate) fn offset_in_ancestor(&self, id: BoxId, ancestor: BoxId) -> LogicalVec2<Au> {
        let mut offset = LogicalVec2::zero();
        let mut current = id;
        while current != ancestor {
            offset += self[current].geometry.border_box.start_corner;
            match self.offset_parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        offset
    }

    /// The floats the box is responsible for painting.
    pub fn floats_painted_by(&self, id: BoxId) -> Result<Vec<BoxId>, BoxTreeError> {
        self.get(id)?;
        let mut floats = Vec::new();
        let mut current = Some(id);
        while let Some(ancestor) = current {
            if let Some(registry) = self[ancestor].float_registry.as_ref() {
                floats.extend(registry.painted_by(id).map(|entry| entry.box_id));
                break;
            }
            current = self[ancestor].parent;
        }
        Ok(floats)
    }

    /// The floats placed in the formatting context established by `id`, in the
    /// order hit testing visits them.
    pub fn float_hit_test_order(&self, id: BoxId) -> Result<Vec<BoxId>, BoxTreeError> {
        Ok(self
            .get(id)?
            .float_registry
            .as_ref()
            .map(|registry| registry.hit_test_order().map(|entry| entry.box_id).collect())
            .unwrap_or_default())
    }

    /// Lays out every box that needs it. Does nothing when the tree is clean.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "BoxTree::layout", skip_all)
    )]
    pub fn layout(&mut self, context: &LayoutContext) -> Result<(), BoxTreeError> {
        let root = self.root;
        self.get(root)?;
        if !self[root].needs_layout {
            debug!("Box tree is clean, skipping layout");
            return Ok(());
        }

        debug!("Laying out box tree");
        flow::layout_root(self, context);
        overflow::compute(self);

        if context.options.debug.dump_box_tree {
            debug!("Box tree after layout:\n{}", self.dump());
        }
        Ok(())
    }

    /// A human readable rendering of the tree and its geometry.
    pub fn dump(&self) -> String {
        let mut output = String::new();
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self[id];
            let rect = &node.geometry.border_box;
            let _ = writeln!(
                output,
                "{:indent$}{:?} {:?} at ({}, {}) size {}x{}{}",
                "",
                id,
                node.role,
                rect.start_corner.inline.to_f32_px(),
                rect.start_corner.block.to_f32_px(),
                rect.size.inline.to_f32_px(),
                rect.size.block.to_f32_px(),
                if node.needs_layout { " (dirty)" } else { "" },
                indent = depth * 2,
            );
            stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        output
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::style::{Float, Overflow};

    fn block() -> BoxStyle {
        BoxStyle::default()
    }

    #[test]
    fn test_roles_and_capabilities() {
        let mut tree = BoxTree::new(block());
        let root = tree.root();
        assert_eq!(tree[root].role, BoxRole::Root);
        assert!(tree[root]
            .capabilities
            .contains(Capabilities::ESTABLISHES_FORMATTING_CONTEXT | Capabilities::CONTAINS_POSITIONED));

        let plain = tree.create_box(block());
        let floated = tree.create_box(BoxStyle {
            float: Float::Left,
            ..block()
        });
        let scroller = tree.create_box(BoxStyle {
            overflow: Overflow::Auto,
            ..block()
        });
        let clipped = tree.create_box(BoxStyle {
            overflow: Overflow::Clip,
            ..block()
        });
        for id in [plain, floated, scroller, clipped] {
            tree.append_child(root, id).unwrap();
        }

        assert_eq!(tree[plain].role, BoxRole::Block);
        assert!(!tree[plain].establishes_new_formatting_context());
        assert!(tree[floated].is_floating());
        assert!(tree[floated].establishes_new_formatting_context());
        assert!(!tree[floated].capabilities.contains(Capabilities::AVOIDS_FLOATS));
        assert_eq!(
            tree[scroller].role,
            BoxRole::FlowRoot(FlowRootReason::ScrollContainer)
        );
        assert!(tree[scroller].capabilities.contains(
            Capabilities::AVOIDS_FLOATS | Capabilities::MONOLITHIC | Capabilities::CLIPS_OVERFLOW
        ));
        // `overflow: clip` clips without starting a formatting context.
        assert_eq!(tree[clipped].role, BoxRole::Block);
        assert!(tree[clipped].capabilities.contains(Capabilities::CLIPS_OVERFLOW));
    }

    #[test]
    fn test_writing_mode_change_makes_a_flow_root() {
        let mut tree = BoxTree::new(block());
        let child = tree.create_box(BoxStyle {
            writing_mode: crate::style::WritingMode::VerticalRl,
            ..block()
        });
        tree.append_child(tree.root(), child).unwrap();
        assert_eq!(
            tree[child].role,
            BoxRole::FlowRoot(FlowRootReason::WritingModeRoot)
        );
        assert!(tree[child].capabilities.contains(Capabilities::MONOLITHIC));
    }

    #[test]
    fn test_insertion_errors() {
        let mut tree = BoxTree::new(block());
        let root = tree.root();
        let parent = tree.create_box(block());
        let child = tree.create_box(block());
        let stranger = tree.create_box(block());
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();

        assert_eq!(
            tree.append_child(child, parent),
            Err(BoxTreeError::WouldCreateCycle {
                parent: child,
                child: parent
            })
        );
        assert_eq!(
            tree.insert_before(parent, stranger, root),
            Err(BoxTreeError::NotAChild {
                parent,
                child: root
            })
        );
        assert_eq!(tree.append_child(parent, root), Err(BoxTreeError::DetachRoot));

        tree.insert_before(parent, stranger, child).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[stranger, child]);

        // Appending an attached box moves it.
        tree.append_child(root, child).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[stranger]);
        assert_eq!(tree.parent(child).unwrap(), Some(root));

        let replaced = tree.create_box(block());
        tree.set_replaced_size(replaced, LogicalVec2::zero()).unwrap();
        assert_eq!(
            tree.append_child(replaced, stranger),
            Err(BoxTreeError::NotAContainer(replaced))
        );
        assert_eq!(
            tree.set_replaced_size(parent, LogicalVec2::zero()),
            Err(BoxTreeError::NotAContainer(parent))
        );
    }

    #[test]
    fn test_removed_ids_become_stale() {
        let mut tree = BoxTree::new(block());
        let root = tree.root();
        let parent = tree.create_box(block());
        let child = tree.create_box(block());
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();

        tree.remove(parent).unwrap();
        assert_eq!(tree.get(child).err(), Some(BoxTreeError::StaleBox(child)));
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.remove(root), Err(BoxTreeError::DetachRoot));

        // The slot is reused with a new generation.
        let reused = tree.create_box(block());
        assert_ne!(reused, parent);
        assert!(!tree.contains(parent));
        assert!(tree.contains(reused));
    }

    #[test]
    fn test_dirtiness_propagates_to_ancestors() {
        let mut tree = BoxTree::new(block());
        let root = tree.root();
        let parent = tree.create_box(block());
        let child = tree.create_box(block());
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();
        for id in [root, parent, child] {
            tree[id].needs_layout = false;
        }

        tree.mark_needs_layout(child).unwrap();
        assert!(tree.needs_layout(root).unwrap());
        assert!(tree.needs_layout(parent).unwrap());

        tree[root].needs_layout = false;
        tree[parent].needs_layout = false;
        tree[child].needs_layout = false;
        let sibling = tree.create_box(block());
        tree.append_child(root, sibling).unwrap();
        assert!(tree.needs_layout(root).unwrap());
        assert!(!tree.needs_layout(parent).unwrap());
    }

    #[test]
    fn test_excluded_child_must_be_a_child() {
        let mut tree = BoxTree::new(block());
        let root = tree.root();
        let caption = tree.create_box(block());
        assert_eq!(
            tree.set_excluded_child(root, caption, Box::new(StackAtBlockStart)),
            Err(BoxTreeError::NotAChild {
                parent: root,
                child: caption
            })
        );
        tree.append_child(root, caption).unwrap();
        tree.set_excluded_child(root, caption, Box::new(StackAtBlockStart))
            .unwrap();
        assert_eq!(
            tree[caption].role,
            BoxRole::FlowRoot(FlowRootReason::Excluded)
        );
    }
}
