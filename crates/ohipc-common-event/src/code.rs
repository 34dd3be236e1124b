//! Operation codes.

use std::fmt;

use ohipc_core::FIRST_CALL_TRANSACTION;

/// Operation codes of the common event service.
///
/// Values are part of the wire contract and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommonEventInterfaceCode {
    /// Publish an event on behalf of the caller.
    PublishCommonEvent = FIRST_CALL_TRANSACTION,
    /// Publish an event on behalf of a given uid.
    PublishCommonEvent2,
    /// Register a subscriber.
    SubscribeCommonEvent,
    /// Remove a subscriber.
    UnsubscribeCommonEvent,
    /// Fetch the last sticky event with a given name.
    GetStickyCommonEvent,
    /// Dump service state.
    DumpState,
    /// Finish an ordered delivery.
    FinishReceiver,
    /// Freeze a uid.
    Freeze,
    /// Unfreeze a uid.
    Unfreeze,
    /// Unfreeze every uid.
    UnfreezeAll,
    /// Drop a sticky event.
    RemoveStickyCommonEvent,
    /// Switch static subscribers on or off.
    SetStaticSubscriberState,
    /// Switch static subscribers on or off for given events.
    SetStaticSubscriberEventsState,
    /// Freeze or unfreeze a set of pids.
    SetFreezeStatus,
}

impl CommonEventInterfaceCode {
    /// All codes, in ascending order.
    pub const ALL: [CommonEventInterfaceCode; 14] = [
        CommonEventInterfaceCode::PublishCommonEvent,
        CommonEventInterfaceCode::PublishCommonEvent2,
        CommonEventInterfaceCode::SubscribeCommonEvent,
        CommonEventInterfaceCode::UnsubscribeCommonEvent,
        CommonEventInterfaceCode::GetStickyCommonEvent,
        CommonEventInterfaceCode::DumpState,
        CommonEventInterfaceCode::FinishReceiver,
        CommonEventInterfaceCode::Freeze,
        CommonEventInterfaceCode::Unfreeze,
        CommonEventInterfaceCode::UnfreezeAll,
        CommonEventInterfaceCode::RemoveStickyCommonEvent,
        CommonEventInterfaceCode::SetStaticSubscriberState,
        CommonEventInterfaceCode::SetStaticSubscriberEventsState,
        CommonEventInterfaceCode::SetFreezeStatus,
    ];

    /// Wire value.
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

impl From<CommonEventInterfaceCode> for u32 {
    fn from(code: CommonEventInterfaceCode) -> Self {
        code.code()
    }
}

impl fmt::Display for CommonEventInterfaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// Operation codes of the event receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventReceiveCode {
    /// Deliver one event.
    NotifyEvent = FIRST_CALL_TRANSACTION,
}

impl From<EventReceiveCode> for u32 {
    fn from(code: EventReceiveCode) -> Self {
        code as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_from_first_call() {
        for (offset, code) in (0u32..).zip(CommonEventInterfaceCode::ALL) {
            assert_eq!(code.code(), FIRST_CALL_TRANSACTION + offset);
            assert_eq!(CommonEventInterfaceCode::from_code(code.code()), Some(code));
        }
        assert_eq!(CommonEventInterfaceCode::from_code(0), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CommonEventInterfaceCode::Freeze.to_string(),
            "Freeze(8)"
        );
    }
}
