//! Convenience re-exports for common event clients and services.

pub use crate::code::CommonEventInterfaceCode;
pub use crate::error::CesErrorCode;
pub use crate::memory::InMemoryCommonEventService;
pub use crate::proxy::CommonEventProxy;
pub use crate::receiver::{EventReceiveProxy, EventReceiveStub, EventReceiver};
pub use crate::service::CommonEventService;
pub use crate::stub::{COMMON_EVENT_DESCRIPTOR, CommonEventStub};
pub use crate::types::{
    CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo, MatchingSkills, ThreadMode,
};
