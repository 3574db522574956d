/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Intrinsic sizes and the resolution of used sizes.
//!
//! <https://drafts.csswg.org/css-sizing/>

use app_units::Au;
use euclid::num::Zero;

use crate::box_tree::{BoxContents, BoxId, BoxTree, Capabilities};
use crate::geom::LogicalSides;
use crate::style::{BoxSizing, BoxStyle, Size};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ContentSizes {
    pub min_content: Au,
    pub max_content: Au,
}

impl ContentSizes {
    pub fn zero() -> Self {
        Self {
            min_content: Au::zero(),
            max_content: Au::zero(),
        }
    }

    pub fn max(&self, other: Self) -> Self {
        Self {
            min_content: self.min_content.max(other.min_content),
            max_content: self.max_content.max(other.max_content),
        }
    }

    pub fn map(&self, f: impl Fn(Au) -> Au) -> Self {
        Self {
            min_content: f(self.min_content),
            max_content: f(self.max_content),
        }
    }

    /// <https://drafts.csswg.org/css2/visudet.html#shrink-to-fit-float>
    pub fn shrink_to_fit(&self, available_size: Au) -> Au {
        // This formula is designed to give priority to the minimum content size
        // when it is larger than the available size.
        available_size
            .min(self.max_content)
            .max(self.min_content)
    }
}

/// The sum of padding and border on each side, resolved against the containing
/// block's inline size.
pub(crate) fn padding_border(style: &BoxStyle, containing_inline_size: Au) -> LogicalSides<Au> {
    style.padding_for(containing_inline_size) + style.border_for()
}

/// Converts a specified size in the box's `box-sizing` into a content-box size.
fn to_content_box(style: &BoxStyle, size: Au, padding_border_sum: Au) -> Au {
    match style.box_sizing {
        BoxSizing::ContentBox => size,
        BoxSizing::BorderBox => (size - padding_border_sum).max(Au::zero()),
    }
}

/// Clamps a content-box inline size between the box's `min-inline-size` and
/// `max-inline-size`. `min` wins over `max`.
pub(crate) fn clamp_inline_size(
    style: &BoxStyle,
    content_inline_size: Au,
    padding_border_sum: Au,
    containing_inline_size: Au,
) -> Au {
    let min = to_content_box(
        style,
        style.min_inline_size.resolve(containing_inline_size),
        padding_border_sum,
    );
    let max = style
        .max_inline_size
        .maybe_resolve(Some(containing_inline_size))
        .map(|max| to_content_box(style, max, padding_border_sum));
    let clamped = match max {
        Some(max) => content_inline_size.min(max),
        None => content_inline_size,
    };
    clamped.max(min).max(Au::zero())
}

/// Clamps a content-box block size between `min-block-size` and `max-block-size`.
/// Percentages against an indefinite containing block behave as their initial values.
pub(crate) fn clamp_block_size(
    style: &BoxStyle,
    content_block_size: Au,
    padding_border_sum: Au,
    containing_block_size: Option<Au>,
) -> Au {
    let min = style
        .min_block_size
        .maybe_resolve(containing_block_size)
        .map(|min| to_content_box(style, min, padding_border_sum))
        .unwrap_or_else(Au::zero);
    let max = style
        .max_block_size
        .maybe_resolve(containing_block_size)
        .map(|max| to_content_box(style, max, padding_border_sum));
    let clamped = match max {
        Some(max) => content_block_size.min(max),
        None => content_block_size,
    };
    clamped.max(min).max(Au::zero())
}

/// The content-box block size given by the box's own `block-size`, if it is definite.
pub(crate) fn specified_block_size(
    style: &BoxStyle,
    padding_border_sum: Au,
    containing_block_size: Option<Au>,
) -> Option<Au> {
    style
        .block_size
        .maybe_resolve(containing_block_size)
        .map(|size| to_content_box(style, size, padding_border_sum))
}

/// Resolves the used content-box block size from the size of the content.
pub(crate) fn resolve_block_size(
    style: &BoxStyle,
    content_block_size: Au,
    padding_border_sum: Au,
    containing_block_size: Option<Au>,
) -> Au {
    let size = specified_block_size(style, padding_border_sum, containing_block_size)
        .unwrap_or(content_block_size);
    clamp_block_size(style, size, padding_border_sum, containing_block_size)
}

/// The used inline size and inline margins of an in-flow block-level box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InlineSizeSolution {
    pub content_inline_size: Au,
    pub margin_inline_start: Au,
    pub margin_inline_end: Au,
}

/// <https://drafts.csswg.org/css2/visudet.html#blockwidth>
///
/// `available_inline_size` is the space given to the margin box. It is the
/// containing block's inline size unless the box is being placed beside floats.
pub(crate) fn solve_inline_size(
    style: &BoxStyle,
    padding_border_sum: Au,
    containing_inline_size: Au,
    available_inline_size: Au,
    inline_size_override: Option<Au>,
) -> InlineSizeSolution {
    let margin_start = style.margin.inline_start.resolve(containing_inline_size);
    let margin_end = style.margin.inline_end.resolve(containing_inline_size);

    let specified = inline_size_override.or_else(|| {
        style
            .inline_size
            .resolve(containing_inline_size)
            .map(|size| to_content_box(style, size, padding_border_sum))
    });

    let content_inline_size = match specified {
        Some(size) => size,
        None => {
            available_inline_size -
                padding_border_sum -
                margin_start.unwrap_or_else(Au::zero) -
                margin_end.unwrap_or_else(Au::zero)
        },
    };
    let content_inline_size = clamp_inline_size(
        style,
        content_inline_size,
        padding_border_sum,
        containing_inline_size,
    );

    let free_space = available_inline_size - padding_border_sum - content_inline_size;
    let (margin_inline_start, margin_inline_end) = match (margin_start, margin_end) {
        (None, None) => {
            let start = Au((free_space.0 / 2).max(0));
            (start, free_space - start)
        },
        (None, Some(end)) => (free_space - end, end),
        (Some(start), None) => (start, free_space - start),
        // Over-constrained: the inline-end margin gives way.
        (Some(start), Some(_)) => (start, free_space - start),
    };

    InlineSizeSolution {
        content_inline_size,
        margin_inline_start,
        margin_inline_end,
    }
}

/// The used content-box inline size of a float, or of an out-of-flow box whose
/// inline size isn't given by its insets.
///
/// <https://drafts.csswg.org/css2/visudet.html#float-width>
pub(crate) fn shrink_to_fit_inline_size(
    tree: &BoxTree,
    id: BoxId,
    containing_inline_size: Au,
    available_inline_size: Au,
) -> Au {
    let style = &tree[id].style;
    let padding_border_sum = padding_border(style, containing_inline_size).inline_sum();
    let margin_sum = style.margin_for(containing_inline_size).inline_sum();
    let specified = style
        .inline_size
        .resolve(containing_inline_size)
        .map(|size| to_content_box(style, size, padding_border_sum));
    let content_inline_size = specified.unwrap_or_else(|| match &tree[id].contents {
        BoxContents::Replaced(size) => size.inline,
        _ => inline_content_sizes(tree, id)
            .shrink_to_fit(available_inline_size - padding_border_sum - margin_sum),
    });
    clamp_inline_size(
        style,
        content_inline_size,
        padding_border_sum,
        containing_inline_size,
    )
}

/// <https://dbaron.org/css/intrinsic/#outer-intrinsic>
///
/// Percentages of the inline size and of padding and margins are treated as
/// `auto` and zero respectively.
pub(crate) fn outer_inline_content_sizes(
    style: &BoxStyle,
    inner: impl FnOnce() -> ContentSizes,
) -> ContentSizes {
    let padding_border_sum = style
        .padding
        .map(|value| value.maybe_resolve(None).unwrap_or_else(Au::zero))
        .inline_sum() +
        style.border_for().inline_sum();

    let specified = match style.inline_size {
        Size::Fixed(size) => Some(to_content_box(style, size, padding_border_sum)),
        Size::Auto | Size::Percentage(_) => None,
    };
    let content = match specified {
        Some(size) => ContentSizes {
            min_content: size,
            max_content: size,
        },
        None => inner(),
    };

    let min = style
        .min_inline_size
        .maybe_resolve(None)
        .map(|min| to_content_box(style, min, padding_border_sum))
        .unwrap_or_else(Au::zero);
    let max = style
        .max_inline_size
        .maybe_resolve(None)
        .map(|max| to_content_box(style, max, padding_border_sum));
    let content = content.map(|size| {
        let size = match max {
            Some(max) => size.min(max),
            None => size,
        };
        size.max(min)
    });

    let margin_sum = [style.margin.inline_start, style.margin.inline_end]
        .iter()
        .map(|margin| match margin {
            Size::Fixed(length) => *length,
            Size::Auto | Size::Percentage(_) => Au::zero(),
        })
        .fold(Au::zero(), |sum, margin| sum + margin);

    content.map(|size| size + padding_border_sum + margin_sum)
}

/// The inner min-content and max-content inline sizes of a box.
pub(crate) fn inline_content_sizes(tree: &BoxTree, id: BoxId) -> ContentSizes {
    let node = &tree[id];
    let from_children = || {
        node.children
            .iter()
            .filter(|child| {
                let child = &tree[**child];
                child.is_displayed() && !child.capabilities.contains(Capabilities::OUT_OF_FLOW)
            })
            .fold(ContentSizes::zero(), |sizes, child| {
                sizes.max(outer_inline_content_sizes(&tree[*child].style, || {
                    inline_content_sizes(tree, *child)
                }))
            })
    };

    match &node.contents {
        BoxContents::Replaced(size) => ContentSizes {
            min_content: size.inline,
            max_content: size.inline,
        },
        BoxContents::Inline(content) => content.intrinsic_inline_sizes().max(from_children()),
        BoxContents::BlockLevelBoxes => from_children(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::style::{Display, LengthPercentage, MaxSize};

    fn px(value: i32) -> Au {
        Au::from_px(value)
    }

    #[test]
    fn test_undisplayed_children_have_no_content_size() {
        let mut tree = BoxTree::new(BoxStyle::default());
        let root = tree.root();
        let shown = tree.create_box(BoxStyle {
            inline_size: Size::px(50),
            ..BoxStyle::default()
        });
        let hidden = tree.create_box(BoxStyle {
            display: Display::None,
            inline_size: Size::px(400),
            ..BoxStyle::default()
        });
        tree.append_child(root, shown).unwrap();
        tree.append_child(root, hidden).unwrap();

        let sizes = inline_content_sizes(&tree, root);
        assert_eq!(sizes.min_content, px(50));
        assert_eq!(sizes.max_content, px(50));
    }

    #[test]
    fn test_shrink_to_fit() {
        let sizes = ContentSizes {
            min_content: px(50),
            max_content: px(200),
        };
        assert_eq!(sizes.shrink_to_fit(px(100)), px(100));
        assert_eq!(sizes.shrink_to_fit(px(300)), px(200));
        assert_eq!(sizes.shrink_to_fit(px(10)), px(50));
    }

    #[test]
    fn test_auto_margins_center() {
        let style = BoxStyle {
            inline_size: Size::px(100),
            margin: LogicalSides {
                inline_start: Size::Auto,
                inline_end: Size::Auto,
                block_start: Size::px(0),
                block_end: Size::px(0),
            },
            ..BoxStyle::default()
        };
        let solution = solve_inline_size(&style, Au::zero(), px(300), px(300), None);
        assert_eq!(solution.content_inline_size, px(100));
        assert_eq!(solution.margin_inline_start, px(100));
        assert_eq!(solution.margin_inline_end, px(100));
    }

    #[test]
    fn test_over_constrained_margins_yield_at_inline_end() {
        let style = BoxStyle {
            inline_size: Size::px(100),
            margin: LogicalSides {
                inline_start: Size::px(20),
                inline_end: Size::px(20),
                block_start: Size::px(0),
                block_end: Size::px(0),
            },
            ..BoxStyle::default()
        };
        let solution = solve_inline_size(&style, Au::zero(), px(300), px(300), None);
        assert_eq!(solution.margin_inline_start, px(20));
        assert_eq!(solution.margin_inline_end, px(180));
    }

    #[test]
    fn test_auto_inline_size_fills_and_clamps() {
        let style = BoxStyle {
            max_inline_size: MaxSize::Fixed(px(150)),
            padding: LogicalSides::uniform(LengthPercentage::px(5)),
            ..BoxStyle::default()
        };
        let solution = solve_inline_size(&style, px(10), px(300), px(300), None);
        assert_eq!(solution.content_inline_size, px(150));

        let solution = solve_inline_size(&BoxStyle::default(), Au::zero(), px(300), px(5), None);
        assert_eq!(solution.content_inline_size, px(5));
    }

    #[test]
    fn test_block_size_resolution() {
        let style = BoxStyle {
            block_size: Size::Percentage(0.5),
            ..BoxStyle::default()
        };
        assert_eq!(resolve_block_size(&style, px(30), Au::zero(), None), px(30));
        assert_eq!(
            resolve_block_size(&style, px(30), Au::zero(), Some(px(400))),
            px(200)
        );

        let style = BoxStyle {
            block_size: Size::px(100),
            box_sizing: BoxSizing::BorderBox,
            min_block_size: LengthPercentage::px(120),
            ..BoxStyle::default()
        };
        assert_eq!(resolve_block_size(&style, px(30), px(20), None), px(100));
    }
}
