/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Property tests for float placement, clearance and margin collapsing.

use app_units::Au;
use euclid::num::Zero;
use block_layout::geom::{LogicalRect, LogicalSides};
use block_layout::margins::CollapsedMargin;
use block_layout::style::{Clear, Float, Size};
use block_layout::{BoxId, BoxStyle, BoxTree, LayoutContext, LayoutOptions};
use quickcheck::{QuickCheck, TestResult};

const CONTAINER_INLINE_SIZE: i32 = 300;
const MAX_FLOATS: usize = 12;

fn px(value: i32) -> Au {
    Au::from_px(value)
}

fn context() -> LayoutContext {
    LayoutContext::new(LayoutOptions {
        viewport_width: CONTAINER_INLINE_SIZE as f32,
        ..LayoutOptions::default()
    })
}

fn float_style(left: bool, inline_size: u8, block_size: u8) -> BoxStyle {
    BoxStyle {
        float: if left { Float::Left } else { Float::Right },
        inline_size: Size::px(1 + i32::from(inline_size) % 150),
        block_size: Size::px(1 + i32::from(block_size) % 60),
        ..BoxStyle::default()
    }
}

fn margin(value: i8) -> i32 {
    i32::from(value) % 51
}

fn with_block_margins(block_size: i32, block_start: i32, block_end: i32) -> BoxStyle {
    BoxStyle {
        block_size: Size::px(block_size),
        margin: LogicalSides {
            inline_start: Size::px(0),
            inline_end: Size::px(0),
            block_start: Size::px(block_start),
            block_end: Size::px(block_end),
        },
        ..BoxStyle::default()
    }
}

/// Builds a root with the given floats followed by a `clear: both` block.
fn tree_with_floats(floats: &[(bool, u8, u8)]) -> (BoxTree, Vec<BoxId>, BoxId) {
    let mut tree = BoxTree::new(BoxStyle::default());
    let root = tree.root();
    let mut ids = Vec::new();
    for &(left, inline_size, block_size) in floats.iter().take(MAX_FLOATS) {
        let id = tree.create_box(float_style(left, inline_size, block_size));
        tree.append_child(root, id).unwrap();
        ids.push(id);
    }
    let cleared = tree.create_box(BoxStyle {
        clear: Clear::Both,
        block_size: Size::px(1),
        ..BoxStyle::default()
    });
    tree.append_child(root, cleared).unwrap();
    tree.layout(&context()).unwrap();
    (tree, ids, cleared)
}

fn border_box(tree: &BoxTree, id: BoxId) -> LogicalRect<Au> {
    tree.geometry(id).unwrap().border_box
}

fn prop_floats_do_not_overlap(floats: Vec<(bool, u8, u8)>) -> bool {
    let (tree, ids, _) = tree_with_floats(&floats);
    let rects: Vec<_> = ids.iter().map(|id| border_box(&tree, *id)).collect();

    let inside = rects.iter().all(|rect| {
        rect.start_corner.inline >= Au::zero() &&
            rect.max_inline_position() <= px(CONTAINER_INLINE_SIZE)
    });
    let disjoint = rects.iter().enumerate().all(|(index, rect)| {
        rects[index + 1..]
            .iter()
            .all(|other| !rect.intersects(other))
    });
    // A float is never placed above one that precedes it.
    let ordered = rects
        .windows(2)
        .all(|pair| pair[0].start_corner.block <= pair[1].start_corner.block);
    inside && disjoint && ordered
}

fn prop_clearance_moves_below_every_float(floats: Vec<(bool, u8, u8)>) -> TestResult {
    if floats.is_empty() {
        return TestResult::discard();
    }
    let (tree, ids, cleared) = tree_with_floats(&floats);
    let lowest = ids
        .iter()
        .map(|id| border_box(&tree, *id).max_block_position())
        .max()
        .unwrap_or_default();
    TestResult::from_bool(border_box(&tree, cleared).start_corner.block >= lowest)
}

fn prop_sibling_margins_collapse(after: i8, before: i8) -> bool {
    let (after, before) = (margin(after), margin(before));
    let mut tree = BoxTree::new(BoxStyle::default());
    let root = tree.root();
    let first = tree.create_box(with_block_margins(10, 0, after));
    let second = tree.create_box(with_block_margins(10, before, 0));
    tree.append_child(root, first).unwrap();
    tree.append_child(root, second).unwrap();
    tree.layout(&context()).unwrap();

    let positive = after.max(before).max(0);
    let negative = (-after).max(-before).max(0);
    let gap = border_box(&tree, second).start_corner.block -
        border_box(&tree, first).max_block_position();
    gap == px(positive - negative)
}

fn prop_margin_adjoin_is_order_independent(a: i16, b: i16, c: i16) -> bool {
    let [a, b, c] = [a, b, c].map(|value| CollapsedMargin::new(px(i32::from(value))));
    a.adjoin(&b) == b.adjoin(&a) && a.adjoin(&b).adjoin(&c) == a.adjoin(&b.adjoin(&c))
}

fn prop_relayout_is_idempotent(children: Vec<(u8, i8, i8)>, dirty: usize) -> TestResult {
    if children.is_empty() {
        return TestResult::discard();
    }
    let mut tree = BoxTree::new(BoxStyle::default());
    let root = tree.root();
    let mut ids = Vec::new();
    for &(block_size, before, after) in children.iter().take(MAX_FLOATS) {
        let style = if block_size % 4 == 0 {
            float_style(before >= 0, block_size, after as u8)
        } else {
            with_block_margins(i32::from(block_size % 40), margin(before), margin(after))
        };
        let id = tree.create_box(style);
        tree.append_child(root, id).unwrap();
        ids.push(id);
    }
    let context = context();
    tree.layout(&context).unwrap();
    let first = tree.snapshot();

    tree.mark_needs_layout(ids[dirty % ids.len()]).unwrap();
    tree.layout(&context).unwrap();
    TestResult::from_bool(tree.snapshot() == first)
}

#[test]
fn floats_do_not_overlap() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop_floats_do_not_overlap as fn(Vec<(bool, u8, u8)>) -> bool);
}

#[test]
fn clearance_moves_below_every_float() {
    QuickCheck::new().tests(200).quickcheck(
        prop_clearance_moves_below_every_float as fn(Vec<(bool, u8, u8)>) -> TestResult,
    );
}

#[test]
fn sibling_margins_collapse() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop_sibling_margins_collapse as fn(i8, i8) -> bool);
}

#[test]
fn margin_adjoin_is_order_independent() {
    QuickCheck::new()
        .quickcheck(prop_margin_adjoin_is_order_independent as fn(i16, i16, i16) -> bool);
}

#[test]
fn relayout_is_idempotent() {
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop_relayout_is_idempotent as fn(Vec<(u8, i8, i8)>, usize) -> TestResult);
}
