/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The contract with the inline layout collaborator.
//!
//! Line breaking and glyph shaping live outside this crate. A block container
//! whose content is a run of inline-level content delegates to an
//! [`InlineContent`] implementation and only sees the resulting block size and
//! whether any line boxes were produced.

use std::fmt;

use app_units::Au;
use euclid::num::Zero;
use smallvec::SmallVec;

use crate::sizing::ContentSizes;

/// The outcome of laying out inline content at a given inline size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InlineLayoutResult {
    /// The block size taken by all line boxes.
    pub content_block_size: Au,
    /// Whether any line box was produced. A block whose inline content produced
    /// no lines may be self-collapsing.
    pub has_lines: bool,
    /// Optional breakdown of `content_block_size` into line boxes, in order.
    /// When present, fragmentation treats each line as an unbreakable unit;
    /// when empty, the content is treated as a single unbreakable piece.
    pub line_block_sizes: SmallVec<[Au; 8]>,
}

impl InlineLayoutResult {
    pub fn empty() -> Self {
        InlineLayoutResult {
            content_block_size: Au::zero(),
            has_lines: false,
            line_block_sizes: SmallVec::new(),
        }
    }
}

pub trait InlineContent: fmt::Debug {
    /// Lay the content out into lines of the given inline size.
    fn layout(&self, inline_size: Au) -> InlineLayoutResult;

    /// The min-content and max-content inline sizes of the content.
    fn intrinsic_inline_sizes(&self) -> ContentSizes;
}

/// Inline content made of lines of known sizes.
///
/// Each entry is an atomic run `(inline_size, block_size)`. Runs are packed
/// greedily into lines; a run wider than the line still gets a line of its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineStack {
    pub runs: Vec<(Au, Au)>,
}

impl LineStack {
    pub fn new(runs: Vec<(Au, Au)>) -> Self {
        LineStack { runs }
    }

    /// A run of `count` lines, each of the given size, that never wrap into one another.
    pub fn uniform_lines(count: usize, inline_size: Au, block_size: Au) -> Self {
        LineStack {
            runs: vec![(inline_size, block_size); count],
        }
    }
}

impl InlineContent for LineStack {
    fn layout(&self, inline_size: Au) -> InlineLayoutResult {
        let mut lines: SmallVec<[Au; 8]> = SmallVec::new();
        let mut line_inline_size = Au::zero();
        let mut line_block_size = Au::zero();
        let mut line_is_empty = true;
        for &(run_inline_size, run_block_size) in &self.runs {
            if !line_is_empty && line_inline_size + run_inline_size > inline_size {
                lines.push(line_block_size);
                line_inline_size = Au::zero();
                line_block_size = Au::zero();
            }
            line_inline_size += run_inline_size;
            line_block_size = line_block_size.max(run_block_size);
            line_is_empty = false;
        }
        if !line_is_empty {
            lines.push(line_block_size);
        }

        InlineLayoutResult {
            content_block_size: lines.iter().fold(Au::zero(), |sum, line| sum + *line),
            has_lines: !lines.is_empty(),
            line_block_sizes: lines,
        }
    }

    fn intrinsic_inline_sizes(&self) -> ContentSizes {
        self.runs
            .iter()
            .fold(ContentSizes::zero(), |sizes, &(inline_size, _)| ContentSizes {
                min_content: sizes.min_content.max(inline_size),
                max_content: sizes.max_content + inline_size,
            })
    }
}
