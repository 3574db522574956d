/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The resolved style snapshot consumed by layout.
//!
//! Style resolution happens elsewhere; layout only ever reads these values,
//! which stay immutable for the duration of a layout pass.

use app_units::Au;
use euclid::num::Zero;

use crate::geom::LogicalSides;

/// A length that may be a percentage of some reference length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthPercentage {
    Fixed(Au),
    Percentage(f32),
}

impl LengthPercentage {
    pub fn zero() -> Self {
        LengthPercentage::Fixed(Au::zero())
    }

    pub fn px(px: i32) -> Self {
        LengthPercentage::Fixed(Au::from_px(px))
    }

    pub fn resolve(&self, basis: Au) -> Au {
        match *self {
            LengthPercentage::Fixed(length) => length,
            LengthPercentage::Percentage(fraction) => basis.scale_by(fraction),
        }
    }

    /// Resolve against a basis that may be indefinite. Percentages against an
    /// indefinite basis resolve to `None`.
    pub fn maybe_resolve(&self, basis: Option<Au>) -> Option<Au> {
        match *self {
            LengthPercentage::Fixed(length) => Some(length),
            LengthPercentage::Percentage(fraction) => basis.map(|basis| basis.scale_by(fraction)),
        }
    }

    pub fn has_percentage(&self) -> bool {
        matches!(self, LengthPercentage::Percentage(_))
    }
}

/// `auto` or a length, used for sizes, margins and box offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Size {
    Auto,
    Fixed(Au),
    /// A fraction of the reference length, so `0.5` is `50%`.
    Percentage(f32),
}

impl Size {
    pub fn px(px: i32) -> Self {
        Size::Fixed(Au::from_px(px))
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Size::Auto)
    }

    pub fn non_auto(&self) -> Option<LengthPercentage> {
        match *self {
            Size::Auto => None,
            Size::Fixed(length) => Some(LengthPercentage::Fixed(length)),
            Size::Percentage(fraction) => Some(LengthPercentage::Percentage(fraction)),
        }
    }

    /// Resolve against a definite basis, with `auto` mapping to `None`.
    pub fn resolve(&self, basis: Au) -> Option<Au> {
        self.non_auto().map(|value| value.resolve(basis))
    }

    /// Resolve against a basis that may be indefinite. Both `auto` and a
    /// percentage of an indefinite basis are `None`.
    pub fn maybe_resolve(&self, basis: Option<Au>) -> Option<Au> {
        self.non_auto().and_then(|value| value.maybe_resolve(basis))
    }

    pub fn auto_is(&self, basis: Au, f: impl FnOnce() -> Au) -> Au {
        self.resolve(basis).unwrap_or_else(f)
    }

    /// Whether this is a fixed or percentage value of zero.
    pub fn is_zero(&self) -> bool {
        match *self {
            Size::Auto => false,
            Size::Fixed(length) => length == Au::zero(),
            Size::Percentage(fraction) => fraction == 0.,
        }
    }
}

/// `none` or a length, used for maximum sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxSize {
    None,
    Fixed(Au),
    Percentage(f32),
}

impl MaxSize {
    pub fn maybe_resolve(&self, basis: Option<Au>) -> Option<Au> {
        match *self {
            MaxSize::None => None,
            MaxSize::Fixed(length) => Some(length),
            MaxSize::Percentage(fraction) => basis.map(|basis| basis.scale_by(fraction)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Display {
    Block,
    FlowRoot,
    InlineBlock,
    TableCell,
    TableCaption,
    /// A child of a flex container, laid out here as an independent block.
    FlexItem,
    /// A child of a grid container, laid out here as an independent block.
    GridItem,
    /// The box is removed from layout entirely.
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

impl Position {
    pub fn is_absolutely_positioned(self) -> bool {
        matches!(self, Position::Absolute | Position::Fixed)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Float {
    None,
    Left,
    Right,
    InlineStart,
    InlineEnd,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Clear {
    None,
    Left,
    Right,
    InlineStart,
    InlineEnd,
    Both,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Overflow {
    Visible,
    Clip,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    /// Whether content is clipped to the padding box.
    pub fn clips(self) -> bool {
        self != Overflow::Visible
    }

    /// Whether this value makes the box a scroll container. `clip` clips
    /// without making a scroll container, so it does not start a formatting
    /// context.
    pub fn is_scrollable(self) -> bool {
        matches!(self, Overflow::Hidden | Overflow::Scroll | Overflow::Auto)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WritingMode {
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoxSizing {
    ContentBox,
    BorderBox,
}

/// How a margin takes part in margin collapsing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarginCollapse {
    Collapse,
    /// The margin never collapses with adjoining margins.
    Separate,
    /// The margin, and every margin it would collapse with, is treated as zero.
    Discard,
}

/// Values of `break-before` and `break-after`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BreakBetween {
    Auto,
    Avoid,
    AvoidPage,
    AvoidColumn,
    Page,
    Column,
    Left,
    Right,
    Recto,
    Verso,
}

/// Values of `break-inside`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BreakInside {
    Auto,
    Avoid,
    AvoidPage,
    AvoidColumn,
}

/// The style of one box, as resolved by the cascade.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStyle {
    pub display: Display,
    pub position: Position,
    pub float: Float,
    pub clear: Clear,
    pub overflow: Overflow,
    pub writing_mode: WritingMode,
    pub direction: Direction,
    pub box_sizing: BoxSizing,

    pub inline_size: Size,
    pub block_size: Size,
    pub min_inline_size: LengthPercentage,
    pub min_block_size: LengthPercentage,
    pub max_inline_size: MaxSize,
    pub max_block_size: MaxSize,

    pub margin: LogicalSides<Size>,
    pub padding: LogicalSides<LengthPercentage>,
    pub border: LogicalSides<Au>,
    /// `inset-*` offsets for positioned boxes.
    pub offsets: LogicalSides<Size>,

    pub margin_before_collapse: MarginCollapse,
    pub margin_after_collapse: MarginCollapse,
    /// Set by the user agent stylesheet for margins that quirks mode may ignore.
    pub margin_before_quirk: bool,
    pub margin_after_quirk: bool,
    /// Whether this box was generated by the `<body>` element.
    pub is_body: bool,

    pub break_before: BreakBetween,
    pub break_after: BreakBetween,
    pub break_inside: BreakInside,

    pub column_count: Option<u32>,
    pub column_width: Option<Au>,

    pub contain_layout: bool,
    pub contain_paint: bool,
    /// Whether the box starts its own paint layer (opacity, transforms,
    /// filters and similar are resolved into this flag by the cascade).
    pub isolation: bool,
}

impl Default for BoxStyle {
    fn default() -> Self {
        BoxStyle {
            display: Display::Block,
            position: Position::Static,
            float: Float::None,
            clear: Clear::None,
            overflow: Overflow::Visible,
            writing_mode: WritingMode::HorizontalTb,
            direction: Direction::Ltr,
            box_sizing: BoxSizing::ContentBox,
            inline_size: Size::Auto,
            block_size: Size::Auto,
            min_inline_size: LengthPercentage::zero(),
            min_block_size: LengthPercentage::zero(),
            max_inline_size: MaxSize::None,
            max_block_size: MaxSize::None,
            margin: LogicalSides::uniform(Size::Fixed(Au::zero())),
            padding: LogicalSides::uniform(LengthPercentage::zero()),
            border: LogicalSides::zero(),
            offsets: LogicalSides::uniform(Size::Auto),
            margin_before_collapse: MarginCollapse::Collapse,
            margin_after_collapse: MarginCollapse::Collapse,
            margin_before_quirk: false,
            margin_after_quirk: false,
            is_body: false,
            break_before: BreakBetween::Auto,
            break_after: BreakBetween::Auto,
            break_inside: BreakInside::Auto,
            column_count: None,
            column_width: None,
            contain_layout: false,
            contain_paint: false,
            isolation: false,
        }
    }
}

impl BoxStyle {
    pub fn is_floating(&self) -> bool {
        self.float != Float::None && !self.position.is_absolutely_positioned()
    }

    pub fn is_out_of_flow_positioned(&self) -> bool {
        self.position.is_absolutely_positioned()
    }

    pub fn specifies_columns(&self) -> bool {
        self.column_count.is_some() || self.column_width.is_some()
    }

    /// Padding resolved against the containing block's inline size (percentages
    /// on every side refer to the inline size).
    pub fn padding_for(&self, containing_inline_size: Au) -> LogicalSides<Au> {
        self.padding
            .map(|value| value.resolve(containing_inline_size).max(Au::zero()))
    }

    pub fn border_for(&self) -> LogicalSides<Au> {
        self.border.map(|value| value.max(Au::zero()))
    }

    /// Margins resolved against the containing block's inline size, with `auto` as zero.
    pub fn margin_for(&self, containing_inline_size: Au) -> LogicalSides<Au> {
        self.margin
            .map(|value| value.resolve(containing_inline_size).unwrap_or_else(Au::zero))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_percentages_against_indefinite_basis() {
        assert_eq!(Size::Percentage(0.5).maybe_resolve(None), None);
        assert_eq!(
            Size::Percentage(0.5).maybe_resolve(Some(Au::from_px(200))),
            Some(Au::from_px(100))
        );
        assert_eq!(Size::Auto.maybe_resolve(Some(Au::from_px(200))), None);
        assert_eq!(
            LengthPercentage::px(7).maybe_resolve(None),
            Some(Au::from_px(7))
        );
    }

    #[test]
    fn test_floating_ignored_for_absolute_boxes() {
        let style = BoxStyle {
            float: Float::Left,
            position: Position::Absolute,
            ..BoxStyle::default()
        };
        assert!(!style.is_floating());
        assert!(style.is_out_of_flow_positioned());
    }
}
