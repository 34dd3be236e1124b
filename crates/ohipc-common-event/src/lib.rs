//! Common event service interface.
//!
//! Publishers hand an event (a [`Want`](ohipc_types::Want) plus a code and
//! a data string) to the service; the service pushes it one-way to every
//! subscriber whose matching skills accept the event name. Sticky events
//! are kept and replayed to late subscribers. Subscribers owned by a frozen
//! uid get their events queued until the uid is unfrozen.
//!
//! Two interfaces are defined here:
//!
//! | Interface | Descriptor | Server | Client |
//! |-----------|------------|--------|--------|
//! | service | `OHOS.EventFwk.ICommonEvent` | [`CommonEventStub`] | [`CommonEventProxy`] |
//! | receiver | `OHOS.EventFwk.IEventReceive` | [`EventReceiveStub`] | [`EventReceiveProxy`] |
//!
//! Malformed requests to the service report
//! [`CesErrorCode::ParamInvalid`] (401) for publish and subscribe, and the
//! generic invalid-value status elsewhere.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod code;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod proxy;
pub mod receiver;
pub mod service;
pub mod stub;
pub mod types;

pub use code::{CommonEventInterfaceCode, EventReceiveCode};
pub use error::CesErrorCode;
pub use memory::{FinishRecord, InMemoryCommonEventService};
pub use proxy::CommonEventProxy;
pub use receiver::{EVENT_RECEIVE_DESCRIPTOR, EventReceiveProxy, EventReceiveStub, EventReceiver};
pub use service::CommonEventService;
pub use stub::{COMMON_EVENT_DESCRIPTOR, CommonEventStub};
pub use types::{
    CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo, MatchingSkills, ThreadMode,
};
