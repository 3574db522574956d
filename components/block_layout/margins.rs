/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Margin collapsing.
//!
//! See CSS 2.1 § 8.3.1: <https://www.w3.org/TR/CSS2/box.html#collapsing-margins>

use app_units::Au;
use euclid::num::Zero;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::style::{BoxStyle, MarginCollapse, Size};

/// Whether legacy quirky margin behaviour is in effect for the document.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    Quirks,
}

/// A set of adjoining margins, tracked as the largest positive and the most
/// negative margin seen so far.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CollapsedMargin {
    max_positive: Au,
    min_negative: Au,
}

impl CollapsedMargin {
    pub fn zero() -> Self {
        Self {
            max_positive: Au::zero(),
            min_negative: Au::zero(),
        }
    }

    pub fn new(margin: Au) -> Self {
        Self {
            max_positive: margin.max(Au::zero()),
            min_negative: margin.min(Au::zero()),
        }
    }

    pub fn from_parts(positive: Au, negative: Au) -> Self {
        Self {
            max_positive: positive.max(Au::zero()),
            min_negative: -negative.max(Au::zero()),
        }
    }

    pub fn adjoin(&self, other: &Self) -> Self {
        Self {
            max_positive: self.max_positive.max(other.max_positive),
            min_negative: self.min_negative.min(other.min_negative),
        }
    }

    /// The resulting margin: the largest positive margin minus the magnitude
    /// of the most negative one.
    pub fn solve(&self) -> Au {
        self.max_positive + self.min_negative
    }

    /// The largest positive margin.
    pub fn positive(&self) -> Au {
        self.max_positive
    }

    /// The magnitude of the most negative margin, as a non-negative length.
    pub fn negative(&self) -> Au {
        -self.min_negative
    }

    pub fn is_zero(&self) -> bool {
        self.max_positive == Au::zero() && self.min_negative == Au::zero()
    }
}

/// The margins of a laid-out box, after collapsing with its own children, as
/// its parent sees them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollapsedBlockMargins {
    pub before: CollapsedMargin,
    pub after: CollapsedMargin,
    /// Whether the box is self-collapsing, so that its before and after
    /// margins collapse through it.
    pub collapsed_through: bool,
    pub discard_before: bool,
    pub discard_after: bool,
    pub quirk_before: bool,
    pub quirk_after: bool,
}

impl CollapsedBlockMargins {
    pub fn zero() -> Self {
        Self {
            before: CollapsedMargin::zero(),
            after: CollapsedMargin::zero(),
            collapsed_through: false,
            discard_before: false,
            discard_after: false,
            quirk_before: false,
            quirk_after: false,
        }
    }

    /// The margins a box has before any collapsing with its children.
    pub fn from_own_margins(style: &BoxStyle, before: Au, after: Au) -> Self {
        let discard_before = style.margin_before_collapse == MarginCollapse::Discard;
        let discard_after = style.margin_after_collapse == MarginCollapse::Discard;
        Self {
            before: if discard_before {
                CollapsedMargin::zero()
            } else {
                CollapsedMargin::new(before)
            },
            after: if discard_after {
                CollapsedMargin::zero()
            } else {
                CollapsedMargin::new(after)
            },
            collapsed_through: false,
            discard_before,
            discard_after,
            quirk_before: style.margin_before_quirk,
            quirk_after: style.margin_after_quirk,
        }
    }
}

/// The running margin state of one block container while its in-flow children
/// are laid out.
///
/// A fresh context is created for each container on each layout pass.
#[derive(Clone, Debug)]
pub struct MarginCollapseContext {
    /// Whether the container lets margins collapse across its edges at all.
    can_collapse_with_children: bool,
    can_collapse_margin_before_with_children: bool,
    can_collapse_margin_after_with_children: bool,
    can_collapse_margin_after_with_last_child: bool,
    /// Whether legacy quirky margins of children at the container's edges are ignored.
    quirk_container: bool,
    quirks_mode: QuirksMode,
    at_before_side_of_block: bool,
    at_after_side_of_block: bool,
    has_margin_before_quirk: bool,
    has_margin_after_quirk: bool,
    determined_margin_before_quirk: bool,
    discard_margin: bool,
    last_child_is_self_collapsing_block_with_clearance: bool,
    positive_margin: Au,
    negative_margin: Au,
}

/// What the container itself contributes when a [`MarginCollapseContext`] is created.
pub struct ContainerMarginInputs<'a> {
    pub style: &'a BoxStyle,
    pub establishes_formatting_context: bool,
    pub quirk_container: bool,
    pub border_padding_before: Au,
    pub border_padding_after: Au,
    /// The container's own before margin, as collapsed so far.
    pub own_margin_before: CollapsedMargin,
    pub must_discard_margin_before: bool,
}

impl MarginCollapseContext {
    pub fn new(inputs: ContainerMarginInputs, quirks_mode: QuirksMode) -> Self {
        let style = inputs.style;
        let can_collapse_with_children = !inputs.establishes_formatting_context;
        let can_collapse_margin_before_with_children = can_collapse_with_children &&
            inputs.border_padding_before == Au::zero() &&
            style.margin_before_collapse != MarginCollapse::Separate;

        // A specified block size other than `auto` stops the after margin from collapsing:
        // children may overflow the box and yet still collapse with it otherwise.
        let auto_block_size = matches!(style.block_size, Size::Auto);
        let can_collapse_margin_after_with_children = can_collapse_with_children &&
            inputs.border_padding_after == Au::zero() &&
            auto_block_size &&
            style.margin_after_collapse != MarginCollapse::Separate;

        let discard_margin =
            can_collapse_margin_before_with_children && inputs.must_discard_margin_before;
        let (positive_margin, negative_margin) =
            if can_collapse_margin_before_with_children && !inputs.must_discard_margin_before {
                (
                    inputs.own_margin_before.positive(),
                    inputs.own_margin_before.negative(),
                )
            } else {
                (Au::zero(), Au::zero())
            };

        MarginCollapseContext {
            can_collapse_with_children,
            can_collapse_margin_before_with_children,
            can_collapse_margin_after_with_children,
            can_collapse_margin_after_with_last_child: true,
            quirk_container: inputs.quirk_container,
            quirks_mode,
            at_before_side_of_block: true,
            at_after_side_of_block: false,
            has_margin_before_quirk: false,
            has_margin_after_quirk: false,
            determined_margin_before_quirk: false,
            discard_margin,
            last_child_is_self_collapsing_block_with_clearance: false,
            positive_margin,
            negative_margin,
        }
    }

    pub fn can_collapse_with_children(&self) -> bool {
        self.can_collapse_with_children
    }

    pub fn can_collapse_margin_before_with_children(&self) -> bool {
        self.can_collapse_margin_before_with_children
    }

    pub fn can_collapse_margin_after_with_children(&self) -> bool {
        self.can_collapse_margin_after_with_children
    }

    /// Whether the child being processed collapses with the container's before margin.
    pub fn can_collapse_with_margin_before(&self) -> bool {
        self.at_before_side_of_block && self.can_collapse_margin_before_with_children
    }

    /// Whether the pending margin collapses with the container's after margin.
    pub fn can_collapse_with_margin_after(&self) -> bool {
        self.at_after_side_of_block && self.can_collapse_margin_after_with_children
    }

    pub fn can_collapse_margin_after_with_last_child(&self) -> bool {
        self.can_collapse_margin_after_with_last_child
    }

    pub fn set_can_collapse_margin_after_with_last_child(&mut self, value: bool) {
        self.can_collapse_margin_after_with_last_child = value;
    }

    pub fn disable_margin_after_collapse_with_children(&mut self) {
        self.can_collapse_margin_after_with_children = false;
    }

    /// Whether quirky margins are ignored in this container.
    pub fn ignores_quirky_margins(&self) -> bool {
        self.quirks_mode == QuirksMode::Quirks && self.quirk_container
    }

    pub fn quirk_container(&self) -> bool {
        self.quirk_container
    }

    pub fn at_before_side_of_block(&self) -> bool {
        self.at_before_side_of_block
    }

    pub fn set_at_before_side_of_block(&mut self, value: bool) {
        self.at_before_side_of_block = value;
    }

    pub fn set_at_after_side_of_block(&mut self, value: bool) {
        self.at_after_side_of_block = value;
    }

    pub fn has_margin_before_quirk(&self) -> bool {
        self.has_margin_before_quirk
    }

    pub fn set_has_margin_before_quirk(&mut self, value: bool) {
        self.has_margin_before_quirk = value;
    }

    pub fn has_margin_after_quirk(&self) -> bool {
        self.has_margin_after_quirk
    }

    pub fn set_has_margin_after_quirk(&mut self, value: bool) {
        self.has_margin_after_quirk = value;
    }

    pub fn determined_margin_before_quirk(&self) -> bool {
        self.determined_margin_before_quirk
    }

    pub fn set_determined_margin_before_quirk(&mut self, value: bool) {
        self.determined_margin_before_quirk = value;
    }

    pub fn discard_margin(&self) -> bool {
        self.discard_margin
    }

    pub fn set_discard_margin(&mut self, value: bool) {
        self.discard_margin = value;
    }

    pub fn last_child_is_self_collapsing_block_with_clearance(&self) -> bool {
        self.last_child_is_self_collapsing_block_with_clearance
    }

    pub fn set_last_child_is_self_collapsing_block_with_clearance(&mut self, value: bool) {
        self.last_child_is_self_collapsing_block_with_clearance = value;
    }

    pub fn positive_margin(&self) -> Au {
        self.positive_margin
    }

    pub fn negative_margin(&self) -> Au {
        self.negative_margin
    }

    pub fn set_positive_margin(&mut self, value: Au) {
        debug_assert!(!self.discard_margin || value == Au::zero());
        self.positive_margin = value;
    }

    pub fn set_negative_margin(&mut self, value: Au) {
        debug_assert!(!self.discard_margin || value == Au::zero());
        self.negative_margin = value;
    }

    pub fn set_positive_margin_if_larger(&mut self, value: Au) {
        if value > self.positive_margin {
            self.set_positive_margin(value);
        }
    }

    pub fn set_negative_margin_if_larger(&mut self, value: Au) {
        if value > self.negative_margin {
            self.set_negative_margin(value);
        }
    }

    pub fn set_margin(&mut self, positive: Au, negative: Au) {
        self.set_positive_margin(positive);
        self.set_negative_margin(negative);
    }

    pub fn clear_margin(&mut self) {
        self.positive_margin = Au::zero();
        self.negative_margin = Au::zero();
    }

    /// The pending margin, collapsed.
    pub fn margin(&self) -> Au {
        self.positive_margin - self.negative_margin
    }
}
