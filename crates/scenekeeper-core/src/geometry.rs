//! Rectangles and display bands.

use serde::{Deserialize, Serialize};

use crate::parcel::{Marshal, Parcel, ParcelError};

/// Window rectangle in display pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub pos_x: i32,
    pub pos_y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(pos_x: i32, pos_y: i32, width: u32, height: u32) -> Self {
        Self {
            pos_x,
            pos_y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bottom edge, exclusive.
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.pos_y) + i64::from(self.height)
    }

    /// True when the vertical extent `[pos_y, bottom)` overlaps `[top, bottom)`.
    #[must_use]
    pub fn overlaps_vertical_band(&self, top: i64, bottom: i64) -> bool {
        let own_top = i64::from(self.pos_y);
        own_top < bottom && self.bottom() > top
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.pos_x, self.pos_y, self.width, self.height
        )
    }
}

impl Marshal for Rect {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.pos_x)?;
        parcel.write_i32(self.pos_y)?;
        parcel.write_u32(self.width)?;
        parcel.write_u32(self.height)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            pos_x: parcel.read_i32()?,
            pos_y: parcel.read_i32()?,
            width: parcel.read_u32()?,
            height: parcel.read_u32()?,
        })
    }
}

/// Vertical band a display occupies in the shared coordinate space.
///
/// Folding devices expose two displays stacked along the fold, so membership
/// is decided by vertical overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBand {
    pub display_id: u64,
    pub top: i64,
    pub bottom: i64,
}

impl DisplayBand {
    #[must_use]
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.overlaps_vertical_band(self.top, self.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_overlap() {
        let rect = Rect::new(0, 100, 50, 100);
        assert!(rect.overlaps_vertical_band(0, 101));
        assert!(rect.overlaps_vertical_band(199, 400));
        assert!(!rect.overlaps_vertical_band(200, 400));
        assert!(!rect.overlaps_vertical_band(0, 100));
    }

    #[test]
    fn band_membership() {
        let upper = DisplayBand {
            display_id: 0,
            top: 0,
            bottom: 1000,
        };
        let lower = DisplayBand {
            display_id: 1,
            top: 1000,
            bottom: 2000,
        };
        let straddling = Rect::new(0, 900, 10, 200);
        assert!(upper.contains(&straddling));
        assert!(lower.contains(&straddling));
        assert!(!lower.contains(&Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn rect_wire_form() {
        let mut parcel = Parcel::new();
        Rect::new(1, 2, 3, 4).marshal(&mut parcel).unwrap();
        assert_eq!(parcel.len(), 16);
        assert_eq!(Rect::unmarshal(&mut parcel).unwrap(), Rect::new(1, 2, 3, 4));
    }
}
