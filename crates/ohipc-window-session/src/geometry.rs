//! Layout values exchanged with a session.
//!
//! Enumerations travel as `u32`. [`Rect`] travels inline as `x`, `y`,
//! `width`, `height`; the composite types wrap their rects in the same
//! layout.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            /// Wire value.
            #[must_use]
            pub fn code(self) -> u32 {
                self as u32
            }

            /// Parse a wire value.
            #[must_use]
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

wire_enum! {
    /// Window mode of a session.
    pub enum WindowMode {
        /// Not decided yet.
        #[default]
        Undefined = 0,
        /// Full screen.
        Fullscreen = 1,
        /// Left or top half of a split.
        SplitPrimary = 100,
        /// Right or bottom half of a split.
        SplitSecondary = 101,
        /// Free floating.
        Floating = 102,
        /// Picture in picture.
        Pip = 103,
    }
}

wire_enum! {
    /// How maximized windows are laid out.
    pub enum MaximizeMode {
        /// Maximize but keep system bars visible.
        #[default]
        AvoidSystemBar = 0,
        /// Maximize over the whole display.
        FullFill = 1,
        /// Restore the previous mode.
        Recover = 2,
    }
}

wire_enum! {
    /// Kind of area a window should keep clear.
    pub enum AvoidAreaType {
        /// System bars.
        #[default]
        System = 0,
        /// Display cutout.
        Cutout = 1,
        /// System gesture zones.
        SystemGesture = 2,
        /// Soft keyboard.
        Keyboard = 3,
        /// Navigation indicator.
        NavigationIndicator = 4,
    }
}

wire_enum! {
    /// Title bar and drag events raised by the client.
    pub enum SessionEvent {
        /// Maximize button.
        #[default]
        Maximize = 0,
        /// Restore button.
        Recover = 1,
        /// Minimize button.
        Minimize = 2,
        /// Close button.
        Close = 3,
        /// Title bar drag started.
        StartMove = 4,
        /// Title bar drag finished.
        EndMove = 5,
        /// Maximize a floating window.
        MaximizeFloating = 6,
        /// The ability terminated.
        Terminate = 7,
        /// The ability raised an exception.
        Exception = 8,
        /// Move to the primary split.
        SplitPrimary = 9,
        /// Move to the secondary split.
        SplitSecondary = 10,
        /// Drag to resize started.
        DragStart = 11,
        /// Drag to resize in progress.
        Drag = 12,
    }
}

wire_enum! {
    /// Placement of a keyboard session.
    pub enum SessionGravity {
        /// Floating keyboard.
        #[default]
        Float = 0,
        /// Docked at the bottom.
        Bottom = 1,
        /// Platform default.
        Default = 2,
    }
}

wire_enum! {
    /// Why a session rect changed.
    pub enum SizeChangeReason {
        /// Unspecified.
        #[default]
        Undefined = 0,
        /// Maximized.
        Maximize = 1,
        /// Restored.
        Recover = 2,
        /// Display rotated.
        Rotation = 3,
        /// Drag in progress.
        Drag = 4,
        /// Drag started.
        DragStart = 5,
        /// Drag finished.
        DragEnd = 6,
        /// Resized.
        Resize = 7,
        /// Moved.
        Move = 8,
        /// Hidden.
        Hide = 9,
        /// Transform applied.
        Transform = 10,
        /// Custom show animation.
        CustomAnimationShow = 11,
        /// Full screen to split.
        FullToSplit = 12,
        /// Split to full screen.
        SplitToFull = 13,
        /// Full screen to floating.
        FullToFloating = 14,
        /// Floating to full screen.
        FloatingToFull = 15,
        /// Picture in picture started.
        PipStart = 16,
        /// Picture in picture shown.
        PipShow = 17,
        /// Picture in picture started automatically.
        PipAutoStart = 18,
        /// Picture in picture ratio changed.
        PipRatioChange = 19,
        /// Picture in picture restored.
        PipRestore = 20,
    }
}

impl SizeChangeReason {
    /// Decode a wire value, treating unknown values as
    /// [`SizeChangeReason::Undefined`].
    #[must_use]
    pub fn from_code_lossy(code: u32) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

/// Window rectangle in display pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Rect {
    /// A rect at (`x`, `y`) of the given size.
    #[must_use]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether every field is still zero.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        *self == Self::default()
    }
}

impl Parcelable for Rect {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_i32(self.x)?;
        parcel.write_i32(self.y)?;
        parcel.write_u32(self.width)?;
        parcel.write_u32(self.height)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            x: parcel.read_i32()?,
            y: parcel.read_i32()?,
            width: parcel.read_u32()?,
            height: parcel.read_u32()?,
        })
    }
}

/// Areas along each display edge that a window should keep clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidArea {
    /// Top edge.
    pub top: Rect,
    /// Left edge.
    pub left: Rect,
    /// Right edge.
    pub right: Rect,
    /// Bottom edge.
    pub bottom: Rect,
}

impl AvoidArea {
    /// Whether nothing needs to be avoided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [self.top, self.left, self.right, self.bottom]
            .iter()
            .all(Rect::is_uninitialized)
    }
}

impl Parcelable for AvoidArea {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        self.top.marshal(parcel)?;
        self.left.marshal(parcel)?;
        self.right.marshal(parcel)?;
        self.bottom.marshal(parcel)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            top: Rect::unmarshal(parcel)?,
            left: Rect::unmarshal(parcel)?,
            right: Rect::unmarshal(parcel)?,
            bottom: Rect::unmarshal(parcel)?,
        })
    }
}

/// Keyboard panel placement for both orientations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardLayoutParams {
    /// Docking of the keyboard.
    pub gravity: SessionGravity,
    /// Keyboard rect in landscape.
    pub landscape_keyboard_rect: Rect,
    /// Keyboard rect in portrait.
    pub portrait_keyboard_rect: Rect,
    /// Panel rect in landscape.
    pub landscape_panel_rect: Rect,
    /// Panel rect in portrait.
    pub portrait_panel_rect: Rect,
}

impl Parcelable for KeyboardLayoutParams {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_u32(self.gravity.code())?;
        self.landscape_keyboard_rect.marshal(parcel)?;
        self.portrait_keyboard_rect.marshal(parcel)?;
        self.landscape_panel_rect.marshal(parcel)?;
        self.portrait_panel_rect.marshal(parcel)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let raw = parcel.read_u32()?;
        let gravity = SessionGravity::from_code(raw)
            .ok_or_else(|| ParcelError::invalid_enum("session gravity", raw))?;
        Ok(Self {
            gravity,
            landscape_keyboard_rect: Rect::unmarshal(parcel)?,
            portrait_keyboard_rect: Rect::unmarshal(parcel)?,
            landscape_panel_rect: Rect::unmarshal(parcel)?,
            portrait_panel_rect: Rect::unmarshal(parcel)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_codes_parse_back() {
        assert_eq!(WindowMode::from_code(102), Some(WindowMode::Floating));
        assert_eq!(WindowMode::from_code(2), None);
        assert_eq!(SessionEvent::from_code(SessionEvent::Drag.code()), Some(SessionEvent::Drag));
        assert_eq!(SizeChangeReason::from_code_lossy(999), SizeChangeReason::Undefined);
    }

    #[test]
    fn test_avoid_area_layout() -> ParcelResult<()> {
        let area = AvoidArea {
            top: Rect::new(0, 0, 1260, 120),
            bottom: Rect::new(0, 2600, 1260, 120),
            ..AvoidArea::default()
        };
        let mut parcel = MessageParcel::new();
        area.marshal(&mut parcel)?;
        assert_eq!(parcel.data_size(), 4 * 4 * 4);
        assert_eq!(AvoidArea::unmarshal(&mut parcel)?, area);
        assert!(!area.is_empty());
        assert!(AvoidArea::default().is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_gravity_is_rejected() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_u32(9)?;
        assert!(matches!(KeyboardLayoutParams::unmarshal(&mut parcel), Err(_)));
        Ok(())
    }
}
