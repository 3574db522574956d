/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Block fragmentation: pages and columns.
//!
//! Content is laid out as one continuous flow. Fragmentainer boundaries are
//! every `fragmentainer_block_size` from the start of that flow, and content is
//! moved down past a boundary by inserting struts in front of it.
//!
//! <https://drafts.csswg.org/css-break/>

use app_units::Au;
use euclid::num::Zero;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::box_tree::Capabilities;
use crate::style::{self, BoxStyle, BreakBetween, BreakInside};

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FragmentationKind {
    #[default]
    Page,
    Column,
}

/// Which fragmentainer an offset exactly on a boundary belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageBoundaryRule {
    AssociateWithFormerPage,
    AssociateWithLatterPage,
}

/// How a box may be broken across fragmentainers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Breakability {
    AllowAnyBreaks,
    /// `break-inside: avoid`. The box moves to the next fragmentainer rather
    /// than break, unless it doesn't fit in an empty fragmentainer either.
    AvoidBreaks,
    /// Monolithic content that is never broken.
    ForbidBreaks,
}

impl Breakability {
    pub(crate) fn for_box(style: &BoxStyle, capabilities: Capabilities) -> Self {
        if capabilities.contains(Capabilities::MONOLITHIC) {
            return Breakability::ForbidBreaks;
        }
        match style.break_inside {
            BreakInside::Avoid | BreakInside::AvoidPage | BreakInside::AvoidColumn => {
                Breakability::AvoidBreaks
            },
            BreakInside::Auto => Breakability::AllowAnyBreaks,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentationContext {
    pub fragmentainer_block_size: Au,
    pub kind: FragmentationKind,
}

impl FragmentationContext {
    pub fn new(fragmentainer_block_size: Au, kind: FragmentationKind) -> Self {
        FragmentationContext {
            fragmentainer_block_size: fragmentainer_block_size.max(Au(1)),
            kind,
        }
    }

    /// The block size left in the fragmentainer at `offset`.
    pub fn remaining_block_size(&self, offset: Au, rule: PageBoundaryRule) -> Au {
        let size = self.fragmentainer_block_size.0;
        let remaining = size - offset.0.rem_euclid(size);
        match rule {
            PageBoundaryRule::AssociateWithLatterPage => Au(remaining),
            PageBoundaryRule::AssociateWithFormerPage => Au(remaining % size),
        }
    }

    /// The start of the fragmentainer following the one that contains `offset`.
    pub fn next_fragmentainer_start(&self, offset: Au, rule: PageBoundaryRule) -> Au {
        offset + self.remaining_block_size(offset, rule)
    }

    /// Whether `offset` lies exactly at the start of a fragmentainer.
    pub fn is_at_fragmentainer_start(&self, offset: Au) -> bool {
        offset.0.rem_euclid(self.fragmentainer_block_size.0) == 0
    }

    /// The offset at which content after a forced break starts. A break at the
    /// very start of a fragmentainer doesn't produce an empty one.
    pub fn apply_forced_break(&self, offset: Au, value: BreakBetween) -> Au {
        if !self.is_forced_break(value) {
            return offset;
        }
        self.next_fragmentainer_start(offset, PageBoundaryRule::AssociateWithFormerPage)
    }

    /// Break values that don't apply to this kind of fragmentation behave as `auto`.
    pub fn normalize(&self, value: BreakBetween) -> BreakBetween {
        match (self.kind, value) {
            (FragmentationKind::Page, BreakBetween::Column | BreakBetween::AvoidColumn) => {
                BreakBetween::Auto
            },
            (
                FragmentationKind::Column,
                BreakBetween::Page |
                BreakBetween::AvoidPage |
                BreakBetween::Left |
                BreakBetween::Right |
                BreakBetween::Recto |
                BreakBetween::Verso,
            ) => BreakBetween::Auto,
            (_, value) => value,
        }
    }

    pub fn is_forced_break(&self, value: BreakBetween) -> bool {
        is_forced_break(self.normalize(value))
    }

    /// Moves a box that must not be broken to the next fragmentainer when it
    /// doesn't fit in what's left of the current one.
    pub fn adjust_for_unsplittable(
        &self,
        offset: Au,
        block_size: Au,
        breakability: Breakability,
    ) -> Au {
        if breakability == Breakability::AllowAnyBreaks {
            return offset;
        }
        let remaining = self.remaining_block_size(offset, PageBoundaryRule::AssociateWithLatterPage);
        if remaining >= block_size {
            return offset;
        }
        // Already at the start of a fragmentainer: moving on would leave this one blank.
        if remaining == self.fragmentainer_block_size {
            return offset;
        }
        offset + remaining
    }

    /// Positions lines of inline content that start at `content_offset` in the
    /// fragmented flow.
    ///
    /// `first_line_may_move_block` is set when the first line is flush with the
    /// content edge of a block that may absorb a strut, in which case pushing
    /// the first line is reported as a strut for the whole block instead.
    pub fn paginate_lines(
        &self,
        content_offset: Au,
        line_block_sizes: &[Au],
        first_line_may_move_block: bool,
    ) -> LinePagination {
        let mut position = Au::zero();
        let mut block_strut = None;
        for (index, line_block_size) in line_block_sizes.iter().enumerate() {
            let remaining = self.remaining_block_size(
                content_offset + position,
                PageBoundaryRule::AssociateWithLatterPage,
            );
            let fits_in_empty_fragmentainer = *line_block_size <= self.fragmentainer_block_size;
            if *line_block_size > remaining && fits_in_empty_fragmentainer {
                if index == 0 && first_line_may_move_block {
                    block_strut = Some(remaining);
                } else {
                    position += remaining;
                }
            }
            position += *line_block_size;
        }
        LinePagination {
            block_size: position,
            block_strut,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePagination {
    /// The block size of all lines, including struts between them.
    pub block_size: Au,
    /// Set when the first line doesn't fit and the block should move instead.
    pub block_strut: Option<Au>,
}

/// Whether a box may hand a pagination strut to its container instead of
/// taking it itself.
pub(crate) fn allows_pagination_strut(
    box_style: &BoxStyle,
    capabilities: Capabilities,
    is_root: bool,
) -> bool {
    !is_root &&
        !capabilities.contains(Capabilities::OUT_OF_FLOW) &&
        !matches!(
            box_style.display,
            style::Display::TableCell |
                style::Display::TableCaption |
                style::Display::FlexItem |
                style::Display::GridItem
        )
}

fn precedence(value: BreakBetween) -> u8 {
    match value {
        BreakBetween::Auto => 0,
        BreakBetween::AvoidColumn => 1,
        BreakBetween::AvoidPage => 2,
        BreakBetween::Avoid => 3,
        BreakBetween::Column => 4,
        BreakBetween::Page => 5,
        BreakBetween::Left | BreakBetween::Right | BreakBetween::Recto | BreakBetween::Verso => 6,
    }
}

/// Combines two break values that meet at the same break point. The stronger
/// one wins, and of two equally strong values the second wins.
pub fn join_break_values(first: BreakBetween, second: BreakBetween) -> BreakBetween {
    if precedence(second) >= precedence(first) {
        second
    } else {
        first
    }
}

pub fn is_forced_break(value: BreakBetween) -> bool {
    matches!(
        value,
        BreakBetween::Column |
            BreakBetween::Page |
            BreakBetween::Left |
            BreakBetween::Right |
            BreakBetween::Recto |
            BreakBetween::Verso
    )
}

#[cfg(test)]
mod test {
    use super::*;

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    fn pages() -> FragmentationContext {
        FragmentationContext::new(px(500), FragmentationKind::Page)
    }

    #[test]
    fn test_remaining_block_size_at_boundaries() {
        let context = pages();
        assert_eq!(
            context.remaining_block_size(px(450), PageBoundaryRule::AssociateWithLatterPage),
            px(50)
        );
        assert_eq!(
            context.remaining_block_size(px(500), PageBoundaryRule::AssociateWithLatterPage),
            px(500)
        );
        assert_eq!(
            context.remaining_block_size(px(500), PageBoundaryRule::AssociateWithFormerPage),
            px(0)
        );
    }

    #[test]
    fn test_unsplittable_content_moves_to_next_page() {
        let context = pages();
        assert_eq!(
            context.adjust_for_unsplittable(px(450), px(600), Breakability::AllowAnyBreaks),
            px(450)
        );
        assert_eq!(
            context.adjust_for_unsplittable(px(450), px(600), Breakability::AvoidBreaks),
            px(500)
        );
        // Already at the top of a page, so it stays even though it's too tall.
        assert_eq!(
            context.adjust_for_unsplittable(px(500), px(600), Breakability::ForbidBreaks),
            px(500)
        );
        assert_eq!(
            context.adjust_for_unsplittable(px(100), px(50), Breakability::ForbidBreaks),
            px(100)
        );
    }

    #[test]
    fn test_forced_breaks() {
        let context = pages();
        assert_eq!(context.apply_forced_break(px(120), BreakBetween::Page), px(500));
        assert_eq!(context.apply_forced_break(px(500), BreakBetween::Page), px(500));
        assert_eq!(context.apply_forced_break(px(120), BreakBetween::Avoid), px(120));
        // Column breaks mean nothing when paginating.
        assert_eq!(context.apply_forced_break(px(120), BreakBetween::Column), px(120));

        let columns = FragmentationContext::new(px(500), FragmentationKind::Column);
        assert!(columns.is_forced_break(BreakBetween::Column));
        assert!(!columns.is_forced_break(BreakBetween::Page));
    }

    #[test]
    fn test_join_break_values() {
        assert_eq!(
            join_break_values(BreakBetween::Page, BreakBetween::Avoid),
            BreakBetween::Page
        );
        assert_eq!(
            join_break_values(BreakBetween::Avoid, BreakBetween::Column),
            BreakBetween::Column
        );
        assert_eq!(
            join_break_values(BreakBetween::Left, BreakBetween::Right),
            BreakBetween::Right
        );
        assert_eq!(
            join_break_values(BreakBetween::Auto, BreakBetween::Auto),
            BreakBetween::Auto
        );
    }

    #[test]
    fn test_line_pagination() {
        let context = pages();
        let lines = [px(20), px(20), px(20)];

        // The second line crosses the boundary at 500 and is pushed.
        let result = context.paginate_lines(px(470), &lines, true);
        assert_eq!(result.block_strut, None);
        assert_eq!(result.block_size, px(20 + 10 + 20 + 20));

        // The first line doesn't fit and the block moves instead.
        let result = context.paginate_lines(px(490), &lines, true);
        assert_eq!(result.block_strut, Some(px(10)));
        assert_eq!(result.block_size, px(60));

        let result = context.paginate_lines(px(490), &lines, false);
        assert_eq!(result.block_strut, None);
        assert_eq!(result.block_size, px(70));

        // Lines taller than a page are never pushed.
        let result = context.paginate_lines(px(490), &[px(600)], false);
        assert_eq!(result.block_size, px(600));
    }
}
