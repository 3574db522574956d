/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Options for a layout run, supplied by the embedder.

use serde::{Deserialize, Serialize};

use crate::fragmentation::FragmentationKind;
use crate::margins::QuirksMode;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// The size of the initial containing block, in CSS pixels.
    pub viewport_width: f32,
    pub viewport_height: f32,

    pub quirks_mode: QuirksMode,

    /// `None` for continuous media.
    pub fragmentation: Option<FragmentationOptions>,

    /// How many times a single child may be laid out while its parent positions it:
    /// the layout at its estimated position and one correction.
    pub max_layout_passes: u32,

    pub debug: DebugOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            viewport_width: 800.,
            viewport_height: 600.,
            quirks_mode: QuirksMode::NoQuirks,
            fragmentation: None,
            max_layout_passes: 2,
            debug: DebugOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct FragmentationOptions {
    /// The block size of each page or column, in CSS pixels.
    pub fragmentainer_block_size: f32,
    #[serde(default)]
    pub kind: FragmentationKind,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Print the box tree after each layout.
    pub dump_box_tree: bool,

    /// Print notifications when there is a relayout.
    pub relayout_event: bool,

    /// Log every placement decision made while laying out children.
    pub trace_layout: bool,
}

impl DebugOptions {
    pub fn extend(&mut self, debug_string: String) -> Result<(), String> {
        for option in debug_string.split(',') {
            match option {
                "dump-box-tree" => self.dump_box_tree = true,
                "relayout-event" => self.relayout_event = true,
                "trace-layout" => self.trace_layout = true,
                "" => {},
                _ => return Err(String::from(option)),
            };
        }
        Ok(())
    }
}
