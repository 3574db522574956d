/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Block layout.
//!
//! Children of a block container are positioned in document order. Each in-flow
//! child is first laid out at an *estimated* block position, computed from the
//! margins it is expected to collapse with, any clearance, and the breaks it is
//! expected to need. Once the child's real margins are known, the position is
//! committed: margins are collapsed, floats are cleared and pagination is
//! applied. A child whose layout depends on its position is then laid out again
//! at the committed position.
//!
//! See CSS 2.1 § 9.4.1 and § 10: <https://www.w3.org/TR/CSS2/visuren.html#block-formatting>

use app_units::Au;
use euclid::num::Zero;
use log::debug;

use crate::box_tree::{BoxContents, BoxId, BoxTree, Capabilities};
use crate::context::{BlockFormattingState, LayoutContext, LayoutInput};
use crate::error::invariant_violation;
use crate::float::{Clear, FloatCheckpoint, FloatRegistry, FloatSide, FloatWalls, PlacementInfo};
use crate::fragmentation::{
    self, Breakability, FragmentationContext, PageBoundaryRule, join_break_values,
};
use crate::geom::{LogicalSides, LogicalVec2};
use crate::margins::{
    CollapsedBlockMargins, CollapsedMargin, ContainerMarginInputs, MarginCollapseContext,
    QuirksMode,
};
use crate::positioned;
use crate::sizing;
use crate::style::{
    BoxStyle, BreakBetween, Direction, LengthPercentage, MarginCollapse, Position, Size,
    WritingMode,
};

macro_rules! trace_layout {
    ($context:expr, $($arg:tt)+) => {
        if $context.trace_layout() {
            log::trace!($($arg)+);
        }
    };
}

/// What the container of a box needs to know about it once it has been laid out.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BlockLayoutResult {
    /// The block size of the border box.
    pub block_size: Au,
    pub margins: CollapsedBlockMargins,
    /// The break values at the edges of the box, joined with those of its
    /// first and last in-flow children.
    pub break_before: BreakBetween,
    pub break_after: BreakBetween,
    pub self_collapsing: bool,
    /// A pagination strut the box asks its container to take in its place,
    /// measured from the block-start edge of the box's border box.
    pub propagated_strut: Option<Au>,
    /// Whether the layout depends on floats outside of the box, so that it
    /// cannot be reused once the box moves.
    pub float_sensitive: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct CachedLayout {
    pub input: LayoutInput,
    pub result: BlockLayoutResult,
}

/// Where an in-flow child goes in the inline axis.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ChildInlineGeometry {
    /// Relative to the container's border box.
    border_box_start: Au,
    content_inline_size: Au,
    margin_inline_start: Au,
    margin_inline_end: Au,
}

/// The fragmented flow as seen from one block container.
#[derive(Clone, Copy, Debug)]
struct Pagination {
    context: FragmentationContext,
    /// The offset of the container's border box from the start of the flow.
    offset: Au,
}

impl Pagination {
    /// The start of the fragmentainer after the one containing `position`.
    fn following_boundary(&self, position: Au) -> Au {
        self.context
            .next_fragmentainer_start(self.offset + position, PageBoundaryRule::AssociateWithLatterPage) -
            self.offset
    }

    fn apply_forced_break(&self, position: Au, value: BreakBetween) -> Au {
        self.context.apply_forced_break(self.offset + position, value) - self.offset
    }

    fn adjust_for_unsplittable(
        &self,
        position: Au,
        block_size: Au,
        breakability: Breakability,
    ) -> Au {
        self.context
            .adjust_for_unsplittable(self.offset + position, block_size, breakability) -
            self.offset
    }
}

/// Where a soft break puts one child.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PaginationAdjustment {
    block_start: Au,
    /// A strut the container takes over, as an offset from its own block start.
    handed_strut: Option<Au>,
}

impl PaginationAdjustment {
    fn stay(block_start: Au) -> Self {
        PaginationAdjustment {
            block_start,
            handed_strut: None,
        }
    }
}

/// The margin before an unlaid-out child is expected to collapse with.
#[derive(Clone, Copy, Debug, Default)]
struct MarginBeforeEstimate {
    positive: Au,
    negative: Au,
    discard: bool,
}

/// Lays out the whole tree, starting from the initial containing block.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "flow::layout_root", skip_all, level = "trace")
)]
pub(crate) fn layout_root(tree: &mut BoxTree, context: &LayoutContext) {
    let root = tree.root();
    let style = tree[root].style.clone();
    let viewport = context.viewport_size();
    let (icb_inline_size, icb_block_size) = match style.writing_mode {
        WritingMode::HorizontalTb => (viewport.width, viewport.height),
        WritingMode::VerticalRl | WritingMode::VerticalLr => (viewport.height, viewport.width),
    };

    let padding_border = sizing::padding_border(&style, icb_inline_size);
    let inline = sizing::solve_inline_size(
        &style,
        padding_border.inline_sum(),
        icb_inline_size,
        icb_inline_size,
        None,
    );
    let margin = style.margin_for(icb_inline_size);
    let input = LayoutInput {
        containing_inline_size: icb_inline_size,
        containing_block_size: Some(icb_block_size),
        content_inline_size: inline.content_inline_size,
        block_size_override: None,
        fragmentation_offset: context.fragmentation().map(|_| margin.block_start),
    };

    debug!(
        "assign_block_size: laying out root at inline size {:?}",
        inline.content_inline_size
    );
    let result = layout_block_level_box(tree, context, root, &input, None);
    place_child(
        tree,
        root,
        LogicalVec2 {
            inline: inline.margin_inline_start,
            block: margin.block_start,
        },
        LogicalSides {
            inline_start: inline.margin_inline_start,
            inline_end: inline.margin_inline_end,
            ..margin
        },
        style.direction,
    );
    debug!("Root block size is {:?}", result.block_size);
}

/// Lays out one block-level box whose inline size has been decided by its container.
///
/// `formatting_state` is the block formatting context the box takes part in,
/// or `None` when the box is laid out on its own. Boxes that establish a
/// formatting context get a fresh one either way.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "flow::layout_block_level_box", skip_all, level = "trace")
)]
pub(crate) fn layout_block_level_box(
    tree: &mut BoxTree,
    context: &LayoutContext,
    id: BoxId,
    input: &LayoutInput,
    formatting_state: Option<&mut BlockFormattingState<'_>>,
) -> BlockLayoutResult {
    let establishes_formatting_context =
        formatting_state.is_none() || tree[id].establishes_new_formatting_context();

    if let Some(result) = reusable_result(
        tree,
        id,
        input,
        establishes_formatting_context,
        formatting_state.as_deref(),
    ) {
        trace_layout!(context, "Reusing the layout of {id:?}");
        positioned::reregister_escaping(tree, id);
        return result;
    }

    let result = match formatting_state {
        Some(formatting_state) if !establishes_formatting_context => {
            layout_block_container(tree, context, id, input, formatting_state, false)
        },
        _ => {
            let mut floats = FloatRegistry::new();
            let direction = tree[id].style.direction;
            let result = layout_block_container(
                tree,
                context,
                id,
                input,
                &mut BlockFormattingState {
                    floats: &mut floats,
                    container_offset: LogicalVec2::zero(),
                    direction,
                },
                true,
            );
            tree[id].float_registry = Some(floats);
            result
        },
    };

    let node = &mut tree[id];
    node.cached = Some(CachedLayout {
        input: input.clone(),
        result: result.clone(),
    });
    node.needs_layout = false;
    result
}

/// The result of the previous layout of the box, if laying it out again would
/// produce the same thing.
fn reusable_result(
    tree: &BoxTree,
    id: BoxId,
    input: &LayoutInput,
    establishes_formatting_context: bool,
    formatting_state: Option<&BlockFormattingState<'_>>,
) -> Option<BlockLayoutResult> {
    let node = &tree[id];
    if node.needs_layout {
        return None;
    }
    let cached = node.cached.as_ref()?;
    if cached.input != *input || cached.result.float_sensitive {
        return None;
    }
    // Floats now around a box that is part of the surrounding formatting
    // context could change its layout.
    if !establishes_formatting_context &&
        formatting_state.is_some_and(|state| !state.floats.is_empty())
    {
        return None;
    }
    Some(cached.result.clone())
}

fn place_child(
    tree: &mut BoxTree,
    child: BoxId,
    start_corner: LogicalVec2<Au>,
    margin: LogicalSides<Au>,
    direction: Direction,
) {
    let geometry = &mut tree[child].geometry;
    geometry.border_box.start_corner = start_corner;
    geometry.margin = margin;
    geometry.direction = direction;
    geometry.pagination_strut = Au::zero();
}

/// The visual offset of a relatively positioned box.
fn relative_offset(
    style: &BoxStyle,
    containing_inline_size: Au,
    containing_block_size: Option<Au>,
) -> LogicalVec2<Au> {
    if style.position != Position::Relative {
        return LogicalVec2::zero();
    }
    let offsets = &style.offsets;
    let inline = match (
        offsets.inline_start.resolve(containing_inline_size),
        offsets.inline_end.resolve(containing_inline_size),
    ) {
        (Some(start), _) => start,
        (None, Some(end)) => -end,
        (None, None) => Au::zero(),
    };
    let block = match (
        offsets.block_start.maybe_resolve(containing_block_size),
        offsets.block_end.maybe_resolve(containing_block_size),
    ) {
        (Some(start), _) => start,
        (None, Some(end)) => -end,
        (None, None) => Au::zero(),
    };
    LogicalVec2 { inline, block }
}

/// Whether the specified block size lets a box without content collapse through.
fn block_size_allows_collapse_through(style: &BoxStyle, containing_block_size: Option<Au>) -> bool {
    match style.block_size {
        Size::Auto => true,
        Size::Percentage(_) if containing_block_size.is_none() => true,
        size => size.is_zero(),
    }
}

fn has_positive_min_block_size(style: &BoxStyle) -> bool {
    match style.min_block_size {
        LengthPercentage::Fixed(length) => length > Au::zero(),
        LengthPercentage::Percentage(fraction) => fraction > 0.,
    }
}

/// Lays out a block container and all of its children, returning what its
/// container needs to position it.
fn layout_block_container(
    tree: &mut BoxTree,
    context: &LayoutContext,
    id: BoxId,
    input: &LayoutInput,
    formatting_state: &mut BlockFormattingState<'_>,
    establishes_formatting_context: bool,
) -> BlockLayoutResult {
    let mut container = BlockContainerState::new(
        tree,
        context,
        id,
        input,
        establishes_formatting_context,
    );
    debug!(
        "assign_block_size({id:?}): laying out {:?} at inline size {:?}",
        tree[id].role, container.content_inline_size
    );

    if container
        .capabilities
        .contains(Capabilities::CONTAINS_POSITIONED)
    {
        tree[id]
            .positioned_registry
            .get_or_insert_with(Default::default)
            .clear();
    } else {
        tree[id].positioned_registry = None;
    }

    let replaced_size = match &tree[id].contents {
        BoxContents::Replaced(size) => Some(*size),
        _ => None,
    };

    match replaced_size {
        Some(_) => container.height = container.padding_border.block_sum(),
        None => {
            let children = tree[id].children.clone();
            let excluded = tree[id].excluded.as_ref().map(|excluded| excluded.child);
            let has_inline_content = matches!(tree[id].contents, BoxContents::Inline(_));

            if let Some(excluded) = excluded {
                container.layout_excluded_child(tree, context, formatting_state, excluded);
            }

            // Floats and positioned children of inline content sit at the start of the lines.
            if has_inline_content {
                for &child in &children {
                    if Some(child) == excluded || !tree[child].is_displayed() {
                        continue;
                    }
                    if tree[child].is_floating() {
                        container.layout_float(tree, context, formatting_state, child);
                    } else if tree[child].is_out_of_flow_positioned() {
                        container.place_out_of_flow(tree, formatting_state, child);
                    }
                }
                container.layout_lines(tree, context);
            }

            for &child in &children {
                if Some(child) == excluded || !tree[child].is_displayed() {
                    continue;
                }
                if tree[child].is_in_flow() {
                    container.layout_in_flow_child(tree, context, formatting_state, child);
                } else if has_inline_content {
                    continue;
                } else if tree[child].is_floating() {
                    container.layout_float(tree, context, formatting_state, child);
                } else {
                    container.place_out_of_flow(tree, formatting_state, child);
                }
            }

            container.handle_after_side();
        },
    }

    // A formatting context root contains its floats.
    if establishes_formatting_context {
        if let Some(lowest_float) = formatting_state.floats.lowest_bottom(Clear::Both) {
            container.height = container
                .height
                .max(lowest_float + container.padding_border.block_end);
        }
    }

    let style = &container.style;
    let padding_border = container.padding_border;
    let padding_border_sum = padding_border.block_sum();
    let content_block_size = match replaced_size {
        Some(size) => size.block,
        None => (container.height - padding_border_sum).max(Au::zero()),
    };
    let block_size = match input.block_size_override {
        Some(size) => sizing::clamp_block_size(
            style,
            size,
            padding_border_sum,
            input.containing_block_size,
        ),
        None => sizing::resolve_block_size(
            style,
            content_block_size,
            padding_border_sum,
            input.containing_block_size,
        ),
    };
    let border_box_block_size = block_size + padding_border_sum;

    let self_collapsing = !establishes_formatting_context &&
        replaced_size.is_none() &&
        border_box_block_size == Au::zero() &&
        padding_border_sum == Au::zero() &&
        !has_positive_min_block_size(style) &&
        style.margin_before_collapse != MarginCollapse::Separate &&
        style.margin_after_collapse != MarginCollapse::Separate &&
        block_size_allows_collapse_through(style, input.containing_block_size) &&
        container.children_self_collapsing &&
        !container.has_lines &&
        !container.has_reserved_space;

    {
        let geometry = &mut tree[id].geometry;
        geometry.border_box.size = LogicalVec2 {
            inline: container.content_inline_size + padding_border.inline_sum(),
            block: border_box_block_size,
        };
        geometry.border = container.border;
        geometry.padding = container.padding;
        geometry.relative_offset = relative_offset(
            style,
            input.containing_inline_size,
            input.containing_block_size,
        );
    }

    let result = BlockLayoutResult {
        block_size: border_box_block_size,
        margins: CollapsedBlockMargins {
            before: container.margin_before,
            after: container.margin_after,
            collapsed_through: self_collapsing,
            discard_before: container.discard_margin_before,
            discard_after: container.discard_margin_after,
            quirk_before: container.quirk_before,
            quirk_after: container.quirk_after,
        },
        break_before: container.break_before,
        break_after: container.break_after,
        self_collapsing,
        propagated_strut: container.propagated_strut,
        float_sensitive: !establishes_formatting_context && !formatting_state.floats.is_empty(),
    };

    if container
        .capabilities
        .contains(Capabilities::CONTAINS_POSITIONED)
    {
        positioned::layout_positioned_descendants(tree, context, id);
    }

    debug!(
        "assign_block_size({id:?}): block size {:?}, self-collapsing {}",
        result.block_size, result.self_collapsing
    );
    result
}

/// The state of one block container while its children are laid out.
struct BlockContainerState {
    id: BoxId,
    style: BoxStyle,
    capabilities: Capabilities,
    establishes_formatting_context: bool,
    border: LogicalSides<Au>,
    padding: LogicalSides<Au>,
    padding_border: LogicalSides<Au>,
    content_inline_size: Au,
    /// The content block size children resolve percentages against, if definite.
    content_block_size: Option<Au>,
    pagination: Option<Pagination>,
    allows_pagination_strut: bool,
    quirks_mode: QuirksMode,
    margins: MarginCollapseContext,

    /// The container's own before margin, collapsed with those of its children.
    margin_before: CollapsedMargin,
    margin_after: CollapsedMargin,
    own_margin_before_is_zero: bool,
    own_margin_after_is_zero: bool,
    discard_margin_before: bool,
    discard_margin_after: bool,
    quirk_before: bool,
    quirk_after: bool,

    /// The current block position, relative to the border box.
    height: Au,
    break_before: BreakBetween,
    break_after: BreakBetween,
    /// The break-after value of the previous in-flow child, if there was one.
    previous_break_after: Option<BreakBetween>,
    previous_child_margins: Option<CollapsedBlockMargins>,
    propagated_strut: Option<Au>,
    has_lines: bool,
    has_reserved_space: bool,
    children_self_collapsing: bool,
}

impl BlockContainerState {
    fn new(
        tree: &BoxTree,
        context: &LayoutContext,
        id: BoxId,
        input: &LayoutInput,
        establishes_formatting_context: bool,
    ) -> Self {
        let node = &tree[id];
        let style = node.style.clone();
        let capabilities = node.capabilities;
        let containing_inline_size = input.containing_inline_size;

        let border = style.border_for();
        let padding = style.padding_for(containing_inline_size);
        let padding_border = border + padding;
        let own_margin = style.margin_for(containing_inline_size);
        let own_margins =
            CollapsedBlockMargins::from_own_margins(&style, own_margin.block_start, own_margin.block_end);

        let pagination = match (context.fragmentation(), input.fragmentation_offset) {
            (Some(fragmentation), Some(offset))
                if !capabilities.contains(Capabilities::MONOLITHIC) =>
            {
                Some(Pagination {
                    context: *fragmentation,
                    offset,
                })
            },
            _ => None,
        };
        let (break_before, break_after) = match pagination {
            Some(pagination) => (
                pagination.context.normalize(style.break_before),
                pagination.context.normalize(style.break_after),
            ),
            None => (style.break_before, style.break_after),
        };

        let margins = MarginCollapseContext::new(
            ContainerMarginInputs {
                style: &style,
                establishes_formatting_context,
                quirk_container: capabilities.contains(Capabilities::QUIRK_CONTAINER),
                border_padding_before: padding_border.block_start,
                border_padding_after: padding_border.block_end,
                own_margin_before: own_margins.before,
                must_discard_margin_before: own_margins.discard_before,
            },
            context.quirks_mode(),
        );

        let padding_border_sum = padding_border.block_sum();
        let content_block_size = match input.block_size_override {
            Some(size) => Some(size),
            None => sizing::specified_block_size(
                &style,
                padding_border_sum,
                input.containing_block_size,
            ),
        }
        .map(|size| {
            sizing::clamp_block_size(&style, size, padding_border_sum, input.containing_block_size)
        });

        BlockContainerState {
            id,
            allows_pagination_strut: fragmentation::allows_pagination_strut(
                &style,
                capabilities,
                id == tree.root(),
            ),
            capabilities,
            establishes_formatting_context,
            border,
            padding,
            padding_border,
            content_inline_size: input.content_inline_size,
            content_block_size,
            pagination,
            quirks_mode: context.quirks_mode(),
            margins,
            margin_before: own_margins.before,
            margin_after: own_margins.after,
            own_margin_before_is_zero: own_margin.block_start == Au::zero(),
            own_margin_after_is_zero: own_margin.block_end == Au::zero(),
            discard_margin_before: own_margins.discard_before,
            discard_margin_after: own_margins.discard_after,
            quirk_before: own_margins.quirk_before,
            quirk_after: own_margins.quirk_after,
            height: padding_border.block_start,
            break_before,
            break_after,
            previous_break_after: None,
            previous_child_margins: None,
            propagated_strut: None,
            has_lines: false,
            has_reserved_space: false,
            children_self_collapsing: true,
            style,
        }
    }

    fn is_at_first_in_flow_child(&self) -> bool {
        self.previous_break_after.is_none() && !self.has_lines
    }

    /// The content edges of the container, relative to the formatting context root.
    fn float_walls(&self, formatting_state: &BlockFormattingState<'_>) -> FloatWalls {
        let inline_start = formatting_state.container_offset.inline + self.padding_border.inline_start;
        FloatWalls {
            inline_start,
            inline_end: inline_start + self.content_inline_size,
        }
    }

    fn child_input(
        &self,
        content_inline_size: Au,
        block_start: Au,
        block_size_override: Option<Au>,
    ) -> LayoutInput {
        LayoutInput {
            containing_inline_size: self.content_inline_size,
            containing_block_size: self.content_block_size,
            content_inline_size,
            block_size_override,
            fragmentation_offset: self
                .pagination
                .map(|pagination| pagination.offset + block_start),
        }
    }

    /// Lays out the child a table, flex or grid container positions itself.
    fn layout_excluded_child(
        &mut self,
        tree: &mut BoxTree,
        context: &LayoutContext,
        formatting_state: &BlockFormattingState<'_>,
        child: BoxId,
    ) {
        let Some(excluded) = tree[self.id].excluded.take() else {
            return;
        };
        if tree.contains(child) && tree[child].is_displayed() {
            let style = tree[child].style.clone();
            let containing_inline_size = self.content_inline_size;
            let padding_border = sizing::padding_border(&style, containing_inline_size);
            let inline = sizing::solve_inline_size(
                &style,
                padding_border.inline_sum(),
                containing_inline_size,
                containing_inline_size,
                None,
            );
            let mut input = self.child_input(inline.content_inline_size, Au::zero(), None);
            input.fragmentation_offset = None;
            let result = layout_block_level_box(tree, context, child, &input, None);

            let margin = LogicalSides {
                inline_start: inline.margin_inline_start,
                inline_end: inline.margin_inline_end,
                ..style.margin_for(containing_inline_size)
            };
            let margin_box_size = LogicalVec2 {
                inline: inline.content_inline_size + padding_border.inline_sum() + margin.inline_sum(),
                block: result.block_size + margin.block_sum(),
            };
            let position = excluded
                .placement
                .place(containing_inline_size, margin_box_size);
            let content_start = self.padding_border.start_offset();
            place_child(
                tree,
                child,
                content_start + position.offset + margin.start_offset(),
                margin,
                formatting_state.direction,
            );

            if position.reserved_block_size > Au::zero() {
                self.height += position.reserved_block_size;
                self.margins.clear_margin();
                self.margins.set_at_before_side_of_block(false);
                self.has_reserved_space = true;
            }
        }
        tree[self.id].excluded = Some(excluded);
    }

    /// Lays out the inline content of the container into lines.
    fn layout_lines(&mut self, tree: &BoxTree, context: &LayoutContext) {
        let lines = match &tree[self.id].contents {
            BoxContents::Inline(content) => content.layout(self.content_inline_size),
            _ => return,
        };
        if !lines.has_lines && lines.content_block_size <= Au::zero() {
            return;
        }

        // Lines have no margins of their own; a pending sibling margin separates them.
        if !self.margins.can_collapse_with_margin_before() && !self.margins.discard_margin() {
            self.height += self.margins.margin();
        }

        let block_size = match self.pagination {
            Some(pagination) => {
                let single_piece = [lines.content_block_size];
                let line_block_sizes = if lines.line_block_sizes.is_empty() {
                    &single_piece[..]
                } else {
                    &lines.line_block_sizes[..]
                };
                let first_line_may_move_block = self.margins.at_before_side_of_block() &&
                    self.height == self.padding_border.block_start &&
                    self.allows_pagination_strut;
                let paginated = pagination.context.paginate_lines(
                    pagination.offset + self.height,
                    line_block_sizes,
                    first_line_may_move_block,
                );
                if let Some(strut) = paginated.block_strut {
                    trace_layout!(
                        context,
                        "First line of {:?} asks for a strut of {strut:?}",
                        self.id
                    );
                    self.propagated_strut = Some(strut + self.height);
                }
                paginated.block_size
            },
            None => lines.content_block_size,
        };

        self.height += block_size;
        self.has_lines = lines.has_lines;
        self.margins.clear_margin();
        self.margins.set_at_before_side_of_block(false);
        self.margins.set_can_collapse_margin_after_with_last_child(true);
    }

    /// Records the static position of an absolutely positioned child. It is laid
    /// out later, by its containing block.
    fn place_out_of_flow(
        &mut self,
        tree: &mut BoxTree,
        formatting_state: &BlockFormattingState<'_>,
        child: BoxId,
    ) {
        let mut block = self.height;
        // Auto-positioned boxes follow a forced break after the previous in-flow sibling.
        if let (Some(pagination), Some(previous)) = (self.pagination, self.previous_break_after) {
            block = pagination.apply_forced_break(block, previous);
        }
        // Positioned boxes don't collapse margins with anything, so the pending
        // margin is added now.
        if !self.margins.can_collapse_with_margin_before() {
            block += self.margins.margin();
        }
        let node = &mut tree[child];
        node.static_position = LogicalVec2 {
            inline: self.padding_border.inline_start,
            block,
        };
        node.geometry.direction = formatting_state.direction;
        positioned::register(tree, child);
    }

    /// Sizes and places a floated child.
    fn layout_float(
        &mut self,
        tree: &mut BoxTree,
        context: &LayoutContext,
        formatting_state: &mut BlockFormattingState<'_>,
        child: BoxId,
    ) {
        let style = tree[child].style.clone();
        let Some(side) = FloatSide::from_style(style.float, formatting_state.direction) else {
            return invariant_violation(format_args!("{child:?} is not floated"), ());
        };
        let containing_inline_size = self.content_inline_size;
        let padding_border = sizing::padding_border(&style, containing_inline_size);
        let margin = style.margin_for(containing_inline_size);
        let content_inline_size = sizing::shrink_to_fit_inline_size(
            tree,
            child,
            containing_inline_size,
            containing_inline_size,
        );
        let walls = self.float_walls(formatting_state);
        let container_offset = formatting_state.container_offset;

        // The float goes below the margin of the previous in-flow box, unless that
        // margin collapses through the top of this container.
        let ceiling = self.height +
            if self.margins.can_collapse_with_margin_before() {
                Au::zero()
            } else {
                self.margins.margin()
            };

        let index = formatting_state.floats.insert(child, side, self.id);
        let mut laid_out_at = ceiling + margin.block_start;
        let mut result = layout_block_level_box(
            tree,
            context,
            child,
            &self.child_input(content_inline_size, laid_out_at, None),
            None,
        );
        let mut passes = 1;
        let mut info = PlacementInfo {
            size: LogicalVec2 {
                inline: content_inline_size + padding_border.inline_sum() + margin.inline_sum(),
                block: result.block_size + margin.block_sum(),
            },
            side,
            clear: Clear::from_style(style.clear, formatting_state.direction),
        };

        let mut placement_ceiling = container_offset.block + ceiling;
        let mut origin = formatting_state
            .floats
            .place_object(&info, placement_ceiling, &walls);
        if let Some(pagination) = self.pagination {
            let margin_box_start = origin.block - container_offset.block;
            let breakability = Breakability::for_box(&style, tree[child].capabilities);
            let after_unsplittable =
                pagination.adjust_for_unsplittable(margin_box_start, info.size.block, breakability);
            // Margins of floats don't collapse with fragmentainer boundaries.
            let with_content_strut = result
                .propagated_strut
                .map_or(margin_box_start, |strut| {
                    margin_box_start + strut + margin.block_start
                });
            let paginated_start = after_unsplittable.max(with_content_strut);
            if paginated_start != margin_box_start {
                trace_layout!(
                    context,
                    "Float {child:?} pushed by {:?} to the next fragmentainer",
                    paginated_start - margin_box_start
                );
                placement_ceiling = origin.block + (paginated_start - margin_box_start);
                origin = formatting_state
                    .floats
                    .place_object(&info, placement_ceiling, &walls);
            }

            let border_box_start = origin.block - container_offset.block + margin.block_start;
            if border_box_start != laid_out_at {
                if passes < context.max_layout_passes() {
                    result = layout_block_level_box(
                        tree,
                        context,
                        child,
                        &self.child_input(content_inline_size, border_box_start, None),
                        None,
                    );
                    passes += 1;
                    laid_out_at = border_box_start;
                    info.size.block = result.block_size + margin.block_sum();
                    if context.relayout_event() {
                        debug!("Relayout of float {child:?} at {laid_out_at:?} (pass {passes})");
                    }
                } else {
                    invariant_violation(
                        format_args!("float {child:?} still moves after {passes} layout passes"),
                        (),
                    );
                }
            }
        }

        let rect = formatting_state
            .floats
            .place(index, &info, placement_ceiling, &walls);
        trace_layout!(context, "Placed float {child:?} at {rect:?}");
        place_child(
            tree,
            child,
            rect.start_corner - container_offset + margin.start_offset(),
            margin,
            formatting_state.direction,
        );
    }

    /// The inline geometry of an in-flow child placed at the container's content edges.
    fn inline_geometry(
        &self,
        tree: &BoxTree,
        child: BoxId,
        style: &BoxStyle,
        available_start: Au,
        available_inline_size: Au,
    ) -> ChildInlineGeometry {
        let padding_border = sizing::padding_border(style, self.content_inline_size);
        let inline_size_override = match &tree[child].contents {
            BoxContents::Replaced(size) if style.inline_size.is_auto() => Some(size.inline),
            _ => None,
        };
        let solution = sizing::solve_inline_size(
            style,
            padding_border.inline_sum(),
            self.content_inline_size,
            available_inline_size.max(Au::zero()),
            inline_size_override,
        );
        ChildInlineGeometry {
            border_box_start: available_start + solution.margin_inline_start,
            content_inline_size: solution.content_inline_size,
            margin_inline_start: solution.margin_inline_start,
            margin_inline_end: solution.margin_inline_end,
        }
    }

    /// How far a child at `block_start` must move down to clear floats, and its
    /// inline geometry once there. Children that avoid floats move down until
    /// they fit beside them.
    fn clearance_and_inline_geometry(
        &self,
        tree: &BoxTree,
        formatting_state: &BlockFormattingState<'_>,
        child: BoxId,
        style: &BoxStyle,
        block_start: Au,
        block_size: Au,
    ) -> (Au, ChildInlineGeometry) {
        let content_start = self.padding_border.inline_start;
        let standard = |this: &Self| {
            this.inline_geometry(tree, child, style, content_start, this.content_inline_size)
        };
        let floats = &*formatting_state.floats;
        if floats.is_empty() {
            return (Au::zero(), standard(self));
        }

        let offset = formatting_state.container_offset;
        let position = offset.block + block_start;
        let clear = Clear::from_style(style.clear, formatting_state.direction);
        let clearance = floats
            .lowest_bottom(clear)
            .map_or(Au::zero(), |bottom| (bottom - position).max(Au::zero()));

        if !tree[child]
            .capabilities
            .contains(Capabilities::AVOIDS_FLOATS)
        {
            return (clearance, standard(self));
        }

        let padding_border = sizing::padding_border(style, self.content_inline_size);
        let inline_size_override = match &tree[child].contents {
            BoxContents::Replaced(size) if style.inline_size.is_auto() => Some(size.inline),
            _ => None,
        };
        let minimum = sizing::solve_inline_size(
            style,
            padding_border.inline_sum(),
            self.content_inline_size,
            Au::zero(),
            inline_size_override,
        );
        let minimum_margin_box = minimum.content_inline_size +
            padding_border.inline_sum() +
            style
                .margin_for(self.content_inline_size)
                .inline_sum()
                .max(Au::zero());
        let area = floats.place_float_avoider(
            position + clearance,
            LogicalVec2 {
                inline: minimum_margin_box,
                block: block_size,
            },
            &self.float_walls(formatting_state),
        );
        let delta = (area.start_corner.block - position).max(clearance);
        let geometry = self.inline_geometry(
            tree,
            child,
            style,
            area.start_corner.inline - offset.inline,
            area.size.inline,
        );
        (delta, geometry)
    }

    /// The before margin of a child that hasn't been laid out with its current style yet.
    fn margin_before_estimate(
        &self,
        tree: &BoxTree,
        child: BoxId,
    ) -> MarginBeforeEstimate {
        let node = &tree[child];
        if !node.needs_layout {
            if let Some(cached) = node.cached.as_ref() {
                let margins = &cached.result.margins;
                return MarginBeforeEstimate {
                    positive: margins.before.positive(),
                    negative: margins.before.negative(),
                    discard: margins.discard_before,
                };
            }
        }
        let mut estimate = MarginBeforeEstimate::default();
        estimate_margin_before_for_child(
            tree,
            self.quirks_mode,
            self.capabilities.contains(Capabilities::QUIRK_CONTAINER),
            self.content_inline_size,
            child,
            &mut estimate,
        );
        estimate
    }

    /// The block position an in-flow child is expected to end up at, before
    /// clearance and breaks.
    fn estimate_block_start(&self, tree: &BoxTree, child: BoxId) -> Au {
        let mut estimate = self.height;
        if !self.margins.can_collapse_with_margin_before() {
            let margin = self.margin_before_estimate(tree, child);
            if !margin.discard {
                estimate += self.margins.positive_margin().max(margin.positive) -
                    self.margins.negative_margin().max(margin.negative);
            }
        }
        // Margins are truncated at fragmentainer boundaries.
        if let Some(pagination) = self.pagination {
            if estimate > self.height {
                estimate = estimate.min(pagination.following_boundary(self.height));
            }
        }
        estimate
    }

    fn layout_child_at(
        &self,
        tree: &mut BoxTree,
        context: &LayoutContext,
        formatting_state: &mut BlockFormattingState<'_>,
        child: BoxId,
        block_start: Au,
        inline: &ChildInlineGeometry,
    ) -> BlockLayoutResult {
        let input = self.child_input(inline.content_inline_size, block_start, None);
        let mut child_state = formatting_state.for_child(LogicalVec2 {
            inline: inline.border_box_start,
            block: block_start,
        });
        layout_block_level_box(tree, context, child, &input, Some(&mut child_state))
    }

    #[allow(clippy::too_many_arguments)]
    fn relayout_child(
        &self,
        tree: &mut BoxTree,
        context: &LayoutContext,
        formatting_state: &mut BlockFormattingState<'_>,
        checkpoint: &FloatCheckpoint,
        child: BoxId,
        block_start: Au,
        inline: &ChildInlineGeometry,
        passes: &mut u32,
    ) -> Option<BlockLayoutResult> {
        if *passes >= context.max_layout_passes() {
            return invariant_violation(
                format_args!("{child:?} still moves after {passes} layout passes"),
                None,
            );
        }
        formatting_state.floats.rollback(checkpoint);
        let result = self.layout_child_at(tree, context, formatting_state, child, block_start, inline);
        *passes += 1;
        if context.relayout_event() {
            debug!("Relayout of {child:?} at {block_start:?} (pass {passes})");
        }
        Some(result)
    }

    /// Lays out and positions one in-flow child.
    fn layout_in_flow_child(
        &mut self,
        tree: &mut BoxTree,
        context: &LayoutContext,
        formatting_state: &mut BlockFormattingState<'_>,
        child: BoxId,
    ) {
        let style = tree[child].style.clone();
        let capabilities = tree[child].capabilities;
        let own_margin = style.margin_for(self.content_inline_size);
        let checkpoint = formatting_state.floats.checkpoint();
        let first_float_index = formatting_state.floats.len();
        let cached = tree[child]
            .cached
            .as_ref()
            .map(|cached| (cached.result.block_size, cached.result.break_before));
        let cached_block_size = cached.map_or(Au::zero(), |(block_size, _)| block_size);

        // Estimate where the child goes, and lay it out there.
        let margin_estimate = self.estimate_block_start(tree, child);
        let (clearance_estimate, mut inline) = self.clearance_and_inline_geometry(
            tree,
            formatting_state,
            child,
            &style,
            margin_estimate,
            cached_block_size,
        );
        let mut estimate = margin_estimate + clearance_estimate;
        if let Some(pagination) = self.pagination {
            if let Some(previous) = self.previous_break_after {
                let break_before = cached.map_or(style.break_before, |(_, value)| value);
                estimate = pagination.apply_forced_break(estimate, join_break_values(previous, break_before));
            }
            let breakability = Breakability::for_box(&style, capabilities);
            let adjusted = pagination.adjust_for_unsplittable(estimate, cached_block_size, breakability);
            estimate = if adjusted == estimate && !tree[child].needs_layout {
                estimate + tree[child].geometry.pagination_strut
            } else {
                adjusted
            };
        }

        let mut passes = 1;
        let mut laid_out_at = estimate;
        let laid_out_inline = inline;
        let mut result =
            self.layout_child_at(tree, context, formatting_state, child, estimate, &inline);
        let margins = if tree[child].needs_layout {
            invariant_violation(
                format_args!("finalizing the margins of {child:?}, which still needs layout"),
                CollapsedBlockMargins::zero(),
            )
        } else {
            result.margins
        };

        let at_before_side = self.margins.at_before_side_of_block();
        let self_collapsing = result.self_collapsing;
        let discard_before = margins.discard_before || (margins.discard_after && self_collapsing);
        let discard_after = margins.discard_after;

        // A forced break in front of the child comes before margin collapsing and clearance.
        let mut strut = Au::zero();
        let mut forced_break = false;
        if let Some(pagination) = self.pagination {
            let break_before = pagination.context.normalize(result.break_before);
            match self.previous_break_after {
                // There is no break point before the first child; the break goes to the container.
                None if self.is_at_first_in_flow_child() => {
                    self.break_before = join_break_values(self.break_before, break_before);
                },
                previous => {
                    let value = join_break_values(previous.unwrap_or(BreakBetween::Auto), break_before);
                    if pagination.context.is_forced_break(value) {
                        self.margins.clear_margin();
                        let before_break = self.height;
                        self.height = pagination.apply_forced_break(self.height, value);
                        strut = self.height - before_break;
                        forced_break = true;
                        trace_layout!(context, "Forced break ({value:?}) before {child:?}");
                    }
                },
            }
        }

        // Commit margins and clearance.
        let old_margin_before = self.margin_before;
        let top_before_clear = self.collapse_margins(
            &margins,
            self_collapsing,
            discard_before,
            discard_after,
            style.margin_before_collapse == MarginCollapse::Separate,
            own_margin.block_start,
        );
        let (clearance, committed_inline) = self.clearance_and_inline_geometry(
            tree,
            formatting_state,
            child,
            &style,
            top_before_clear,
            result.block_size,
        );
        inline = committed_inline;
        let mut block_start = self.clear_floats_if_needed(
            clearance,
            &margins,
            self_collapsing,
            discard_before || discard_after,
            old_margin_before,
            top_before_clear,
        );
        if clearance > Au::zero() {
            trace_layout!(context, "{child:?} clears floats by {clearance:?}");
        }

        // Pagination is judged from the layout we have, then checked once more after the
        // single corrective relayout at the final position.
        let mut handed_strut = None;
        if let Some(pagination) = self.pagination.filter(|_| !forced_break) {
            let flush = at_before_side && top_before_clear == block_start;
            let adjustment = self.pagination_adjustment(
                pagination,
                &style,
                capabilities,
                block_start,
                &result,
                flush,
            );
            strut = adjustment.block_start - block_start;
            handed_strut = adjustment.handed_strut;
            block_start = adjustment.block_start;
        }

        let moved = block_start != laid_out_at;
        if (moved && (self.pagination.is_some() || result.float_sensitive)) ||
            inline != laid_out_inline
        {
            if let Some(relaid) = self.relayout_child(
                tree,
                context,
                formatting_state,
                &checkpoint,
                child,
                block_start,
                &inline,
                &mut passes,
            ) {
                result = relaid;
                laid_out_at = block_start;
            }
        }

        if let Some(pagination) = self.pagination.filter(|_| !forced_break) {
            let flush = at_before_side && top_before_clear == block_start;
            let settled = self.pagination_adjustment(
                pagination,
                &style,
                capabilities,
                block_start,
                &result,
                flush,
            );
            if settled.block_start != laid_out_at {
                // A second correction is over the pass cap; this reports it and keeps the result.
                if let Some(relaid) = self.relayout_child(
                    tree,
                    context,
                    formatting_state,
                    &checkpoint,
                    child,
                    settled.block_start,
                    &inline,
                    &mut passes,
                ) {
                    result = relaid;
                    strut += settled.block_start - block_start;
                    block_start = settled.block_start;
                }
            } else {
                handed_strut = settled.handed_strut;
            }
            if strut > Au::zero() {
                trace_layout!(context, "{child:?} moves by {strut:?} to the next fragmentainer");
                self.height += strut;
            }
            if let Some(handed) = handed_strut {
                trace_layout!(context, "{child:?} hands a strut of {handed:?} to {:?}", self.id);
                self.propagated_strut = Some(handed);
            }
        }

        place_child(
            tree,
            child,
            LogicalVec2 {
                inline: inline.border_box_start,
                block: block_start,
            },
            LogicalSides {
                inline_start: inline.margin_inline_start,
                inline_end: inline.margin_inline_end,
                block_start: own_margin.block_start,
                block_end: own_margin.block_end,
            },
            formatting_state.direction,
        );
        tree[child].geometry.pagination_strut = strut;

        // A later child that isn't self-collapsing lets the after margin collapse again.
        if !self.margins.can_collapse_margin_after_with_last_child() && !self_collapsing {
            self.margins.set_can_collapse_margin_after_with_last_child(true);
        }
        if self.margins.at_before_side_of_block() && !self_collapsing {
            self.margins.set_at_before_side_of_block(false);
        }

        self.height += result.block_size;
        if style.margin_after_collapse == MarginCollapse::Separate {
            self.height += own_margin.block_end;
            self.margins.clear_margin();
        }

        // Floats this child was painting that hang out of it are painted by the container.
        if !tree[child].establishes_new_formatting_context() &&
            !capabilities.contains(Capabilities::PAINT_LAYER)
        {
            let child_block_end =
                formatting_state.container_offset.block + block_start + result.block_size;
            let transferred = formatting_state.floats.transfer_overhanging(
                first_float_index,
                child,
                child_block_end,
                self.id,
            );
            if transferred > 0 {
                trace_layout!(
                    context,
                    "{transferred} floats overhang {child:?} and are painted by {:?}",
                    self.id
                );
            }
        }

        let break_after = match self.pagination {
            Some(pagination) => pagination.context.normalize(result.break_after),
            None => result.break_after,
        };
        self.previous_break_after = Some(break_after);
        self.previous_child_margins = Some(margins);
        self.children_self_collapsing &= self_collapsing;
    }

    /// Collapses the before margin of a child with the pending margin, and
    /// returns the position of the child's border box.
    fn collapse_margins(
        &mut self,
        margins: &CollapsedBlockMargins,
        self_collapsing: bool,
        discard_before: bool,
        discard_after: bool,
        separate_before: bool,
        own_margin_before: Au,
    ) -> Au {
        let mut positive_before = margins.before.positive();
        let mut negative_before = margins.before.negative();
        // The margins of a self-collapsing child collapse through it.
        if self_collapsing {
            positive_before = positive_before.max(margins.after.positive());
            negative_before = negative_before.max(margins.after.negative());
        }
        let quirk_before = margins.quirk_before;
        let ignores_quirks = self.margins.ignores_quirky_margins();

        if self.margins.can_collapse_with_margin_before() {
            if !discard_before && !self.margins.discard_margin() {
                // The child collapses with the top of this container.
                if !(ignores_quirks && quirk_before) {
                    self.margin_before = CollapsedMargin::from_parts(
                        positive_before.max(self.margin_before.positive()),
                        negative_before.max(self.margin_before.negative()),
                    );
                }
                // Any margin involved that isn't quirky keeps the collapsed margin.
                if !self.margins.determined_margin_before_quirk() &&
                    !quirk_before &&
                    positive_before != negative_before
                {
                    self.quirk_before = false;
                    self.margins.set_determined_margin_before_quirk(true);
                }
                if !self.margins.determined_margin_before_quirk() &&
                    quirk_before &&
                    self.own_margin_before_is_zero
                {
                    self.quirk_before = true;
                }
            } else {
                self.discard_margin_before = true;
            }
        }

        if discard_before {
            self.margins.set_discard_margin(true);
            self.margins.clear_margin();
        }

        if self.margins.quirk_container() &&
            self.margins.at_before_side_of_block() &&
            positive_before != negative_before
        {
            self.margins.set_has_margin_before_quirk(quirk_before);
        }

        let before_collapse = self.height;
        let mut block_start = before_collapse;

        // A previous self-collapsing sibling with clearance left the position at
        // the float it cleared; margins collapse at its margin edge instead.
        if !self.margins.can_collapse_with_margin_before() &&
            self.margins.last_child_is_self_collapsing_block_with_clearance()
        {
            if let Some(previous) = self.previous_child_margins {
                self.height -= previous.before.positive();
            }
        }

        if self_collapsing {
            if !discard_before && !self.margins.discard_margin() {
                let collapsed_positive = self.margins.positive_margin().max(margins.before.positive());
                let collapsed_negative = self.margins.negative_margin().max(margins.before.negative());
                self.margins.set_margin(collapsed_positive, collapsed_negative);
                self.margins.set_positive_margin_if_larger(positive_before);
                self.margins.set_negative_margin_if_larger(negative_before);
                if !self.margins.can_collapse_with_margin_before() {
                    block_start = self.height + collapsed_positive - collapsed_negative;
                }
            }
        } else {
            if separate_before {
                let separate_margin = if self.margins.can_collapse_with_margin_before() {
                    Au::zero()
                } else {
                    self.margins.margin()
                };
                self.height += separate_margin + own_margin_before;
                block_start = self.height;
            } else if !self.margins.discard_margin() &&
                (!self.margins.at_before_side_of_block() ||
                    (!self.margins.can_collapse_margin_before_with_children() &&
                        !(ignores_quirks && self.margins.has_margin_before_quirk())))
            {
                // Collapsing with the previous sibling rather than the top of the container.
                self.height += self.margins.positive_margin().max(positive_before) -
                    self.margins.negative_margin().max(negative_before);
                block_start = self.height;
            }

            self.margins.set_discard_margin(discard_after);
            if self.margins.discard_margin() {
                self.margins.clear_margin();
            } else {
                self.margins
                    .set_margin(margins.after.positive(), margins.after.negative());
            }
            if self.margins.margin() != Au::zero() {
                self.margins.set_has_margin_after_quirk(margins.quirk_after);
            }
        }

        // Margins don't push content past the start of the next fragmentainer.
        if let Some(pagination) = self.pagination {
            if block_start > before_collapse {
                let truncated = block_start.min(pagination.following_boundary(before_collapse));
                self.height += truncated - block_start;
                block_start = truncated;
            }
        }
        block_start
    }

    fn clear_floats_if_needed(
        &mut self,
        clearance: Au,
        margins: &CollapsedBlockMargins,
        self_collapsing: bool,
        discard: bool,
        old_margin_before: CollapsedMargin,
        block_start: Au,
    ) -> Au {
        self.margins
            .set_last_child_is_self_collapsing_block_with_clearance(false);
        if clearance == Au::zero() {
            return block_start;
        }

        if self_collapsing {
            // A self-collapsing child with clearance still collapses with the
            // margins of following siblings, but no longer with the container's
            // after margin.
            self.margins
                .set_last_child_is_self_collapsing_block_with_clearance(true);
            self.margins.set_discard_margin(discard);
            if discard {
                self.margins.clear_margin();
            } else {
                self.margins.set_margin(
                    margins.before.positive().max(margins.after.positive()),
                    margins.before.negative().max(margins.after.negative()),
                );
            }
            self.margins
                .set_can_collapse_margin_after_with_last_child(false);
            // Clearance + margin-before puts the border edge at the float's bottom.
            self.height = block_start + clearance + margins.before.negative();
        } else {
            self.height += clearance;
        }

        if self.margins.can_collapse_with_margin_before() {
            // Clearance separates the child from the top of the container.
            self.margin_before = old_margin_before;
            self.margins.set_at_before_side_of_block(false);
            self.discard_margin_before = self.style.margin_before_collapse == MarginCollapse::Discard;
        }

        block_start + clearance
    }

    /// Where a soft break puts a child laid out with `result`, or the strut it hands to the
    /// container instead of moving.
    fn pagination_adjustment(
        &self,
        pagination: Pagination,
        style: &BoxStyle,
        capabilities: Capabilities,
        block_start: Au,
        result: &BlockLayoutResult,
        flush_with_content_edge: bool,
    ) -> PaginationAdjustment {
        let with_content_strut = block_start + result.propagated_strut.unwrap_or_else(Au::zero);
        let after_unsplittable = pagination.adjust_for_unsplittable(
            block_start,
            result.block_size,
            Breakability::for_box(style, capabilities),
        );
        let strut = with_content_strut.max(after_unsplittable) - block_start;
        if strut <= Au::zero() {
            return PaginationAdjustment::stay(block_start);
        }

        if flush_with_content_edge &&
            after_unsplittable == block_start &&
            self.allows_pagination_strut
        {
            return PaginationAdjustment {
                block_start,
                handed_strut: Some(strut + block_start),
            };
        }
        PaginationAdjustment::stay(block_start + strut)
    }

    /// Resolves the pending margin against the block-end edge of the container.
    fn handle_after_side(&mut self) {
        self.margins.set_at_after_side_of_block(true);

        // The last child was self-collapsing with clearance: collapse at its margin edge.
        if self.margins.last_child_is_self_collapsing_block_with_clearance() {
            if let Some(previous) = self.previous_child_margins {
                self.height -= previous.before.positive();
            }
        }

        if self.margins.can_collapse_margin_after_with_children() &&
            !self.margins.can_collapse_margin_after_with_last_child()
        {
            self.margins.disable_margin_after_collapse_with_children();
        }

        // Margins that can't collapse through the block-end edge stay inside.
        if !self.margins.discard_margin() &&
            !self.margins.can_collapse_with_margin_after() &&
            !self.margins.can_collapse_with_margin_before() &&
            !(self.margins.ignores_quirky_margins() && self.margins.has_margin_after_quirk())
        {
            self.height += self.margins.margin();
        }

        self.height += self.padding_border.block_end;
        // Negative margins never shrink the box below its border and padding.
        self.height = self.height.max(self.padding_border.block_sum());

        if self.margins.can_collapse_with_margin_after() &&
            !self.margins.can_collapse_with_margin_before()
        {
            if self.margins.discard_margin() {
                self.discard_margin_after = true;
                self.margin_after = CollapsedMargin::zero();
                return;
            }
            self.margin_after = CollapsedMargin::from_parts(
                self.margin_after.positive().max(self.margins.positive_margin()),
                self.margin_after.negative().max(self.margins.negative_margin()),
            );
            if !self.margins.has_margin_after_quirk() {
                self.quirk_after = false;
            } else if self.own_margin_after_is_zero {
                self.quirk_after = true;
            }
        }

        if let (Some(_), Some(previous)) = (self.pagination, self.previous_break_after) {
            self.break_after = join_break_values(self.break_after, previous);
        }
    }
}

/// Estimates the before margin of an unlaid-out child from its style and those
/// of its first in-flow descendants it would collapse with.
fn estimate_margin_before_for_child(
    tree: &BoxTree,
    quirks_mode: QuirksMode,
    quirk_container: bool,
    containing_inline_size: Au,
    child: BoxId,
    estimate: &mut MarginBeforeEstimate,
) {
    let node = &tree[child];
    let style = &node.style;
    if (quirks_mode == QuirksMode::Quirks && quirk_container && style.margin_before_quirk) ||
        style.margin_before_collapse == MarginCollapse::Separate
    {
        return;
    }
    if style.margin_before_collapse == MarginCollapse::Discard {
        *estimate = MarginBeforeEstimate {
            positive: Au::zero(),
            negative: Au::zero(),
            discard: true,
        };
        return;
    }

    let margin = style.margin_for(containing_inline_size).block_start;
    estimate.positive = estimate.positive.max(margin);
    estimate.negative = estimate.negative.max(-margin);

    if node.establishes_new_formatting_context() ||
        !matches!(node.contents, BoxContents::BlockLevelBoxes)
    {
        return;
    }
    let padding_border = sizing::padding_border(style, containing_inline_size);
    if padding_border.block_start != Au::zero() {
        return;
    }

    let excluded = node.excluded.as_ref().map(|excluded| excluded.child);
    let Some(grandchild) = node
        .children
        .iter()
        .copied()
        .find(|grandchild| Some(*grandchild) != excluded && tree[*grandchild].is_in_flow())
    else {
        return;
    };
    let child_content_inline_size = sizing::solve_inline_size(
        style,
        padding_border.inline_sum(),
        containing_inline_size,
        containing_inline_size,
        None,
    )
    .content_inline_size;

    // A grandchild with clearance and no margin may not need clearance at all
    // once margins are accounted for, so don't guess.
    let grandchild_style = &tree[grandchild].style;
    if grandchild_style.clear != crate::style::Clear::None &&
        grandchild_style
            .margin_for(child_content_inline_size)
            .block_start ==
            Au::zero()
    {
        return;
    }

    estimate_margin_before_for_child(
        tree,
        quirks_mode,
        node.capabilities.contains(Capabilities::QUIRK_CONTAINER),
        child_content_inline_size,
        grandchild,
        estimate,
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::inline::LineStack;
    use crate::options::LayoutOptions;
    use crate::style::{Clear as StyleClear, Float};

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn margins(block_start: i32, block_end: i32) -> LogicalSides<Size> {
        LogicalSides {
            inline_start: Size::px(0),
            inline_end: Size::px(0),
            block_start: Size::px(block_start),
            block_end: Size::px(block_end),
        }
    }

    fn sized(block_size: i32) -> BoxStyle {
        BoxStyle {
            block_size: Size::px(block_size),
            ..BoxStyle::default()
        }
    }

    fn layout(tree: &mut BoxTree) {
        tree.layout(&LayoutContext::new(LayoutOptions::default()))
            .unwrap();
    }

    fn block_start(tree: &BoxTree, id: BoxId) -> Au {
        tree[id].geometry.border_box.start_corner.block
    }

    #[test]
    fn test_margins_collapse_through_parent_top() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let parent = tree.create_box(BoxStyle {
            margin: margins(10, 0),
            ..BoxStyle::default()
        });
        let child = tree.create_box(BoxStyle {
            margin: margins(30, 0),
            ..sized(20)
        });
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();
        layout(&mut tree);

        // The child's margin escapes through the parent, which sits 30px down.
        assert_eq!(block_start(&tree, parent), px(30));
        assert_eq!(block_start(&tree, child), Au::zero());
        assert_eq!(tree[parent].geometry.border_box.size.block, px(20));
        let cached = tree[parent].cached.as_ref().unwrap();
        assert_eq!(cached.result.margins.before.solve(), px(30));
    }

    #[test]
    fn test_padding_keeps_child_margin_inside() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let parent = tree.create_box(BoxStyle {
            padding: LogicalSides {
                block_start: LengthPercentage::px(5),
                ..LogicalSides::uniform(LengthPercentage::zero())
            },
            ..BoxStyle::default()
        });
        let child = tree.create_box(BoxStyle {
            margin: margins(30, 10),
            ..sized(20)
        });
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();
        layout(&mut tree);

        assert_eq!(block_start(&tree, parent), Au::zero());
        assert_eq!(block_start(&tree, child), px(35));
        // The after margin still collapses through the parent's bottom.
        assert_eq!(tree[parent].geometry.border_box.size.block, px(55));
    }

    #[test]
    fn test_self_collapsing_child_and_estimate_reuse() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let first = tree.create_box(sized(10));
        let empty = tree.create_box(BoxStyle {
            margin: margins(15, 25),
            ..BoxStyle::default()
        });
        let last = tree.create_box(BoxStyle {
            margin: margins(5, 0),
            ..sized(10)
        });
        for id in [first, empty, last] {
            tree.append_child(root, id).unwrap();
        }
        layout(&mut tree);

        assert!(tree[empty].cached.as_ref().unwrap().result.self_collapsing);
        assert_eq!(block_start(&tree, last), px(35));
        assert_eq!(tree[root].geometry.border_box.size.block, px(45));

        // The estimate for a clean child comes from its cached margins.
        let before = tree.dump();
        tree.mark_needs_layout(last).unwrap();
        layout(&mut tree);
        assert_eq!(tree.dump(), before);
    }

    #[test]
    fn test_clearance_of_self_collapsing_child() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let float = tree.create_box(BoxStyle {
            float: Float::Left,
            inline_size: Size::px(50),
            ..sized(40)
        });
        let clearing = tree.create_box(BoxStyle {
            clear: StyleClear::Both,
            ..BoxStyle::default()
        });
        let after = tree.create_box(sized(10));
        for id in [float, clearing, after] {
            tree.append_child(root, id).unwrap();
        }
        layout(&mut tree);

        assert_eq!(block_start(&tree, clearing), px(40));
        assert_eq!(block_start(&tree, after), px(40));
        assert_eq!(tree[root].geometry.border_box.size.block, px(50));
    }

    #[test]
    fn test_inline_content_sets_block_size() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let paragraph = tree.create_box(BoxStyle {
            margin: margins(8, 8),
            ..BoxStyle::default()
        });
        tree.append_child(root, paragraph).unwrap();
        tree.set_inline_content(
            paragraph,
            Box::new(LineStack::uniform_lines(3, px(100), px(18))),
        )
        .unwrap();
        layout(&mut tree);

        assert_eq!(tree[paragraph].geometry.border_box.size.block, px(54));
        assert!(!tree[paragraph].cached.as_ref().unwrap().result.self_collapsing);
    }

    #[test]
    fn test_relative_offset_does_not_move_flow() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let shifted = tree.create_box(BoxStyle {
            position: Position::Relative,
            offsets: LogicalSides {
                inline_start: Size::Auto,
                inline_end: Size::px(7),
                block_start: Size::px(12),
                block_end: Size::px(3),
            },
            ..sized(10)
        });
        let next = tree.create_box(sized(10));
        tree.append_child(root, shifted).unwrap();
        tree.append_child(root, next).unwrap();
        layout(&mut tree);

        assert_eq!(
            tree[shifted].geometry.relative_offset,
            LogicalVec2 {
                inline: px(-7),
                block: px(12)
            }
        );
        assert_eq!(block_start(&tree, next), px(10));
    }
}
