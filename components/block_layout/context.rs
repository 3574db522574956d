/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use app_units::Au;

use crate::float::FloatRegistry;
use crate::fragmentation::FragmentationContext;
use crate::geom::{LogicalVec2, PhysicalSize};
use crate::margins::QuirksMode;
use crate::options::LayoutOptions;
use crate::style::Direction;

/// The values shared by every layout call of one layout run.
#[derive(Clone, Debug)]
pub struct LayoutContext {
    pub options: LayoutOptions,
    viewport_size: PhysicalSize<Au>,
    fragmentation: Option<FragmentationContext>,
}

impl LayoutContext {
    pub fn new(options: LayoutOptions) -> Self {
        let viewport_size = PhysicalSize::new(
            Au::from_f32_px(options.viewport_width.max(0.)),
            Au::from_f32_px(options.viewport_height.max(0.)),
        );
        let fragmentation = options.fragmentation.map(|fragmentation| {
            FragmentationContext::new(
                Au::from_f32_px(fragmentation.fragmentainer_block_size),
                fragmentation.kind,
            )
        });
        LayoutContext {
            options,
            viewport_size,
            fragmentation,
        }
    }

    /// The size of the initial containing block.
    pub fn viewport_size(&self) -> PhysicalSize<Au> {
        self.viewport_size
    }

    pub fn fragmentation(&self) -> Option<&FragmentationContext> {
        self.fragmentation.as_ref()
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.options.quirks_mode
    }

    pub(crate) fn max_layout_passes(&self) -> u32 {
        self.options.max_layout_passes
    }

    pub(crate) fn trace_layout(&self) -> bool {
        self.options.debug.trace_layout
    }

    pub(crate) fn relayout_event(&self) -> bool {
        self.options.debug.relayout_event
    }
}

/// The part of a block formatting context that a block container sees while it
/// lays out its children: the float registry of the formatting context root and
/// where the container sits relative to that root.
pub(crate) struct BlockFormattingState<'a> {
    pub floats: &'a mut FloatRegistry,
    /// The position of the container's border box relative to the border box of
    /// the formatting context root.
    pub container_offset: LogicalVec2<Au>,
    /// The inline base direction of the formatting context.
    pub direction: Direction,
}

impl<'a> BlockFormattingState<'a> {
    /// The state seen by a child whose border box starts at `offset` in this container.
    pub fn for_child(&mut self, offset: LogicalVec2<Au>) -> BlockFormattingState<'_> {
        BlockFormattingState {
            floats: &mut *self.floats,
            container_offset: self.container_offset + offset,
            direction: self.direction,
        }
    }
}

/// Everything a box's layout depends on that comes from outside the box.
/// A clean box laid out again with equal inputs produces the same result.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayoutInput {
    pub containing_inline_size: Au,
    /// `None` when the containing block's block size is indefinite.
    pub containing_block_size: Option<Au>,
    /// The used content-box inline size, as decided by the container.
    pub content_inline_size: Au,
    /// A content-box block size imposed by the container, as for boxes
    /// stretched between two insets.
    pub block_size_override: Option<Au>,
    /// The offset of the box's border box from the start of the fragmented flow,
    /// or `None` when the box is not fragmented.
    pub fragmentation_offset: Option<Au>,
}
