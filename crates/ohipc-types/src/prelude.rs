//! Convenience re-exports.
//!
//! ```
//! use ohipc_types::prelude::*;
//!
//! let want = Want::new("usual.event.BOOT_COMPLETED").with_param("user", 100);
//! assert_eq!(want.params.len(), 1);
//! ```

pub use crate::params::{PacMap, ParamValue, WantParams};
pub use crate::session_info::{
    AbilitySessionInfo, AbilityStartSetting, CallToState, ProcessOptions, SessionInfoLayout,
};
pub use crate::uri::Uri;
pub use crate::want::{ElementName, Want};
