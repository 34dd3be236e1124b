//! Common imports for interface crates.
//!
//! ```
//! use ohipc_core::prelude::*;
//!
//! let mut data = MessageParcel::new();
//! data.write_interface_token("demo.IThing")?;
//! check_interface_token("demo.IThing", &mut data)?;
//! # Ok::<(), IpcError>(())
//! ```

pub use crate::{
    config::TransportConfig,
    death::{ChannelDeathRecipient, DeathNotice, DeathRecipient, HandlerDeathRecipient},
    option::MessageOption,
    parcel::{MessageParcel, Parcelable},
    proxy::{RemoteProxy, reply_error},
    remote::RemoteObject,
    runtime::IpcRuntime,
    stub::{DispatchTable, IpcStub, check_interface_token, default_on_remote_request},
};

pub use ohipc_errors::prelude::*;
