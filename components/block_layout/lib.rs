/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Block layout for CSS boxes.
//!
//! A [`BoxTree`] holds boxes with resolved styles. [`BoxTree::layout`] assigns
//! every box its final geometry: margins are collapsed, floats placed and
//! cleared, pagination struts and forced breaks applied, and positioned boxes
//! laid out against their containing blocks. The result is read back either
//! per box or as a list of [`Fragment`]s.

#![deny(unsafe_code)]

pub mod box_tree;
pub mod context;
pub mod error;
pub mod float;
mod flow;
pub mod fragment_tree;
pub mod fragmentation;
pub mod geom;
pub mod inline;
pub mod margins;
pub mod options;
pub mod overflow;
mod positioned;
pub mod sizing;
pub mod style;

pub use box_tree::{
    BoxContents, BoxGeometry, BoxId, BoxNode, BoxRole, BoxTree, Capabilities,
    ExcludedChildPlacement, ExcludedChildPosition, FlowRootReason, StackAtBlockStart,
};
pub use context::LayoutContext;
pub use error::BoxTreeError;
pub use fragment_tree::{Fragment, LayoutSnapshot};
pub use inline::{InlineContent, InlineLayoutResult, LineStack};
pub use options::{DebugOptions, FragmentationOptions, LayoutOptions};
pub use overflow::OverflowAreas;
pub use style::BoxStyle;
