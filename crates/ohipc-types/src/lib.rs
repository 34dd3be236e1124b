//! Parcelable value types shared by several interfaces.
//!
//! These are plain data: each type knows how to write itself into a
//! [`MessageParcel`](ohipc_core::MessageParcel) and read itself back, and
//! nothing else. Interfaces that carry them decide whether a value is
//! required or guarded by a presence flag.
//!
//! - [`Want`]: the intent-like request object, with [`ElementName`],
//!   [`Uri`] and typed [`WantParams`]
//! - [`PacMap`]: typed key/value bag used by ability state save/restore
//! - [`AbilitySessionInfo`]: ability session record passed to the window
//!   layer, with [`ProcessOptions`] and [`AbilityStartSetting`]

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod params;
pub mod prelude;
pub mod session_info;
pub mod uri;
pub mod want;

pub use params::{PacMap, ParamValue, WantParams};
pub use session_info::{
    AbilitySessionInfo, AbilityStartSetting, CallToState, ProcessOptions, SessionInfoLayout,
    is_missing_want,
};
pub use uri::Uri;
pub use want::{ElementName, Want};
