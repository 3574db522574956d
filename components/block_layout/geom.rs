/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Logical and physical geometry.
//!
//! Layout happens entirely in logical coordinates: the inline axis runs along
//! lines of text and the block axis stacks boxes. Conversion to physical
//! coordinates only happens when fragments are handed to painting.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

use app_units::{Au, MAX_AU, MIN_AU};
use euclid::num::Zero;

use crate::style::{Direction, WritingMode};

/// The unit of physical layout coordinates handed to painting and hit testing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LayoutSpace;

pub type PhysicalPoint<T> = euclid::Point2D<T, LayoutSpace>;
pub type PhysicalSize<T> = euclid::Size2D<T, LayoutSpace>;
pub type PhysicalRect<T> = euclid::Rect<T, LayoutSpace>;

#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct LogicalVec2<T> {
    pub inline: T,
    pub block: T,
}

#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct LogicalRect<T> {
    pub start_corner: LogicalVec2<T>,
    pub size: LogicalVec2<T>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LogicalSides<T> {
    pub inline_start: T,
    pub inline_end: T,
    pub block_start: T,
    pub block_end: T,
}

impl<T: fmt::Debug> fmt::Debug for LogicalVec2<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        // Not using f.debug_struct on purpose here, to keep {:?} output somewhat compact
        formatter.write_str("Vec2 { i: ")?;
        self.inline.fmt(formatter)?;
        formatter.write_str(", b: ")?;
        self.block.fmt(formatter)?;
        formatter.write_str(" }")
    }
}

impl<T: fmt::Debug> fmt::Debug for LogicalRect<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Rect")
            .field("start_corner", &self.start_corner)
            .field("size", &self.size)
            .finish()
    }
}

impl<T: Zero> LogicalVec2<T> {
    pub fn zero() -> Self {
        Self {
            inline: T::zero(),
            block: T::zero(),
        }
    }
}

impl<T> LogicalVec2<T> {
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> LogicalVec2<U> {
        LogicalVec2 {
            inline: f(&self.inline),
            block: f(&self.block),
        }
    }
}

impl<T: Add<Output = T> + Copy> Add for LogicalVec2<T> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        LogicalVec2 {
            inline: self.inline + other.inline,
            block: self.block + other.block,
        }
    }
}

impl<T: Sub<Output = T> + Copy> Sub for LogicalVec2<T> {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        LogicalVec2 {
            inline: self.inline - other.inline,
            block: self.block - other.block,
        }
    }
}

impl<T: Add<Output = T> + Copy> AddAssign for LogicalVec2<T> {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<T: Neg<Output = T> + Copy> Neg for LogicalVec2<T> {
    type Output = Self;
    fn neg(self) -> Self {
        LogicalVec2 {
            inline: -self.inline,
            block: -self.block,
        }
    }
}

impl<T: Copy> LogicalSides<T> {
    pub fn uniform(value: T) -> Self {
        LogicalSides {
            inline_start: value,
            inline_end: value,
            block_start: value,
            block_end: value,
        }
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> LogicalSides<U> {
        LogicalSides {
            inline_start: f(self.inline_start),
            inline_end: f(self.inline_end),
            block_start: f(self.block_start),
            block_end: f(self.block_end),
        }
    }
}

impl<T: Zero> LogicalSides<T> {
    pub fn zero() -> Self {
        LogicalSides {
            inline_start: T::zero(),
            inline_end: T::zero(),
            block_start: T::zero(),
            block_end: T::zero(),
        }
    }
}

impl<T: Add<Output = T> + Copy> LogicalSides<T> {
    pub fn inline_sum(&self) -> T {
        self.inline_start + self.inline_end
    }

    pub fn block_sum(&self) -> T {
        self.block_start + self.block_end
    }

    pub fn sum(&self) -> LogicalVec2<T> {
        LogicalVec2 {
            inline: self.inline_sum(),
            block: self.block_sum(),
        }
    }

    pub fn start_offset(&self) -> LogicalVec2<T> {
        LogicalVec2 {
            inline: self.inline_start,
            block: self.block_start,
        }
    }
}

impl<T: Add<Output = T> + Copy> Add for LogicalSides<T> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        LogicalSides {
            inline_start: self.inline_start + other.inline_start,
            inline_end: self.inline_end + other.inline_end,
            block_start: self.block_start + other.block_start,
            block_end: self.block_end + other.block_end,
        }
    }
}

impl LogicalRect<Au> {
    pub fn zero() -> Self {
        LogicalRect {
            start_corner: LogicalVec2::zero(),
            size: LogicalVec2::zero(),
        }
    }

    pub fn from_origin_and_size(origin: LogicalVec2<Au>, size: LogicalVec2<Au>) -> Self {
        LogicalRect {
            start_corner: origin,
            size,
        }
    }

    pub fn max_inline_position(&self) -> Au {
        self.start_corner.inline + self.size.inline
    }

    pub fn max_block_position(&self) -> Au {
        self.start_corner.block + self.size.block
    }

    pub fn translate(&self, offset: LogicalVec2<Au>) -> Self {
        LogicalRect {
            start_corner: self.start_corner + offset,
            size: self.size,
        }
    }

    pub fn inflate(&self, sides: &LogicalSides<Au>) -> Self {
        LogicalRect {
            start_corner: LogicalVec2 {
                inline: self.start_corner.inline - sides.inline_start,
                block: self.start_corner.block - sides.block_start,
            },
            size: LogicalVec2 {
                inline: self.size.inline + sides.inline_sum(),
                block: self.size.block + sides.block_sum(),
            },
        }
    }

    pub fn deflate(&self, sides: &LogicalSides<Au>) -> Self {
        LogicalRect {
            start_corner: LogicalVec2 {
                inline: self.start_corner.inline + sides.inline_start,
                block: self.start_corner.block + sides.block_start,
            },
            size: LogicalVec2 {
                inline: (self.size.inline - sides.inline_sum()).max(Au::zero()),
                block: (self.size.block - sides.block_sum()).max(Au::zero()),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.inline <= Au::zero() || self.size.block <= Au::zero()
    }

    /// Whether the two rectangles share any area. Touching edges do not count.
    pub fn intersects(&self, other: &Self) -> bool {
        self.start_corner.inline < other.max_inline_position() &&
            other.start_corner.inline < self.max_inline_position() &&
            self.start_corner.block < other.max_block_position() &&
            other.start_corner.block < self.max_block_position()
    }

    /// The smallest rectangle containing both. Empty rectangles still extend the union, since
    /// zero-sized boxes can be the only thing that overflows.
    pub fn union(&self, other: &Self) -> Self {
        let inline_start = self.start_corner.inline.min(other.start_corner.inline);
        let block_start = self.start_corner.block.min(other.start_corner.block);
        let inline_end = self
            .max_inline_position()
            .max(other.max_inline_position());
        let block_end = self.max_block_position().max(other.max_block_position());
        LogicalRect {
            start_corner: LogicalVec2 {
                inline: inline_start,
                block: block_start,
            },
            size: LogicalVec2 {
                inline: inline_end - inline_start,
                block: block_end - block_start,
            },
        }
    }

    /// Convert this rectangle, expressed relative to a container of the given physical size, to
    /// physical coordinates.
    pub fn to_physical(
        &self,
        writing_mode: WritingMode,
        direction: Direction,
        container_size: PhysicalSize<Au>,
    ) -> PhysicalRect<Au> {
        let inline_start = match direction {
            Direction::Ltr => self.start_corner.inline,
            Direction::Rtl => {
                let container_inline_size = match writing_mode {
                    WritingMode::HorizontalTb => container_size.width,
                    WritingMode::VerticalRl | WritingMode::VerticalLr => container_size.height,
                };
                container_inline_size - self.max_inline_position()
            },
        };
        match writing_mode {
            WritingMode::HorizontalTb => PhysicalRect::new(
                PhysicalPoint::new(inline_start, self.start_corner.block),
                PhysicalSize::new(self.size.inline, self.size.block),
            ),
            WritingMode::VerticalLr => PhysicalRect::new(
                PhysicalPoint::new(self.start_corner.block, inline_start),
                PhysicalSize::new(self.size.block, self.size.inline),
            ),
            WritingMode::VerticalRl => PhysicalRect::new(
                PhysicalPoint::new(
                    container_size.width - self.max_block_position(),
                    inline_start,
                ),
                PhysicalSize::new(self.size.block, self.size.inline),
            ),
        }
    }
}

impl LogicalVec2<Au> {
    pub fn to_physical_size(&self, writing_mode: WritingMode) -> PhysicalSize<Au> {
        match writing_mode {
            WritingMode::HorizontalTb => PhysicalSize::new(self.inline, self.block),
            WritingMode::VerticalRl | WritingMode::VerticalLr => {
                PhysicalSize::new(self.block, self.inline)
            },
        }
    }
}

/// Adds two lengths, clamping at the representable range instead of overflowing.
pub fn saturating_add(a: Au, b: Au) -> Au {
    Au(a.0.saturating_add(b.0))
}

pub fn saturating_sub(a: Au, b: Au) -> Au {
    Au(a.0.saturating_sub(b.0))
}

/// Whether the value is one of the sentinels used as infinities.
pub fn is_infinite(value: Au) -> bool {
    value == MAX_AU || value == MIN_AU
}

#[cfg(test)]
mod test {
    use super::*;

    fn rect(inline: i32, block: i32, inline_size: i32, block_size: i32) -> LogicalRect<Au> {
        LogicalRect {
            start_corner: LogicalVec2 {
                inline: Au::from_px(inline),
                block: Au::from_px(block),
            },
            size: LogicalVec2 {
                inline: Au::from_px(inline_size),
                block: Au::from_px(block_size),
            },
        }
    }

    #[test]
    fn test_intersects_excludes_touching_edges() {
        let a = rect(0, 0, 10, 10);
        assert!(!a.intersects(&rect(10, 0, 10, 10)));
        assert!(!a.intersects(&rect(0, 10, 10, 10)));
        assert!(a.intersects(&rect(9, 9, 10, 10)));
    }

    #[test]
    fn test_to_physical_rtl_and_vertical() {
        let container = PhysicalSize::new(Au::from_px(300), Au::from_px(200));
        let r = rect(10, 20, 50, 30);

        let ltr = r.to_physical(WritingMode::HorizontalTb, Direction::Ltr, container);
        assert_eq!(ltr.origin, PhysicalPoint::new(Au::from_px(10), Au::from_px(20)));

        let rtl = r.to_physical(WritingMode::HorizontalTb, Direction::Rtl, container);
        assert_eq!(rtl.origin.x, Au::from_px(240));

        let vrl = r.to_physical(WritingMode::VerticalRl, Direction::Ltr, container);
        assert_eq!(vrl.origin, PhysicalPoint::new(Au::from_px(250), Au::from_px(10)));
        assert_eq!(vrl.size, PhysicalSize::new(Au::from_px(30), Au::from_px(50)));
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(saturating_add(MAX_AU, Au::from_px(1)), MAX_AU);
        assert_eq!(saturating_sub(MIN_AU, Au::from_px(1)), MIN_AU);
    }
}
