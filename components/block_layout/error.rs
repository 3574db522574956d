/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{error, fmt};

use crate::box_tree::BoxId;

/// Misuse of the box tree API. Layout itself never fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoxTreeError {
    /// The id refers to a box that has been removed from the tree.
    StaleBox(BoxId),
    /// The box cannot have children, because it holds replaced content.
    NotAContainer(BoxId),
    /// `child` is not a child of `parent`.
    NotAChild { parent: BoxId, child: BoxId },
    /// Inserting the box would make it its own ancestor.
    WouldCreateCycle { parent: BoxId, child: BoxId },
    /// The root box cannot be removed or re-parented.
    DetachRoot,
}

impl fmt::Display for BoxTreeError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoxTreeError::StaleBox(id) => write!(formatter, "box {id:?} is no longer in the tree"),
            BoxTreeError::NotAContainer(id) => {
                write!(formatter, "box {id:?} holds replaced content and cannot have children")
            },
            BoxTreeError::NotAChild { parent, child } => {
                write!(formatter, "box {child:?} is not a child of {parent:?}")
            },
            BoxTreeError::WouldCreateCycle { parent, child } => write!(
                formatter,
                "inserting {child:?} under {parent:?} would make it its own ancestor"
            ),
            BoxTreeError::DetachRoot => formatter.write_str("the root box cannot be detached"),
        }
    }
}

impl error::Error for BoxTreeError {}

/// Reports a broken layout invariant and hands back the value layout should
/// continue with.
///
/// Debug builds panic so the bug gets fixed. Release builds log it and carry on
/// with `fallback`, so that a single bad box can't corrupt the shared registries.
#[track_caller]
pub(crate) fn invariant_violation<T>(message: fmt::Arguments, fallback: T) -> T {
    log::error!("Layout invariant violated: {message}");
    debug_assert!(false, "Layout invariant violated: {message}");
    fallback
}
