//! Remote object handles.

use std::sync::Arc;

use ohipc_errors::IpcResult;

use crate::death::DeathRecipient;
use crate::option::MessageOption;
use crate::parcel::MessageParcel;

/// First operation code available to interfaces.
pub const FIRST_CALL_TRANSACTION: u32 = 0x0000_0001;
/// Last operation code available to interfaces.
pub const LAST_CALL_TRANSACTION: u32 = 0x00ff_ffff;
/// Liveness probe, answered by the transport.
pub const PING_TRANSACTION: u32 = u32::from_be_bytes(*b"_PNG");
/// Descriptor query, answered by the transport with a string16.
pub const INTERFACE_TRANSACTION: u32 = u32::from_be_bytes(*b"_NTF");
/// Diagnostic dump request.
pub const DUMP_TRANSACTION: u32 = u32::from_be_bytes(*b"_DMP");

/// Whether `code` is reserved for the transport itself.
#[must_use]
pub fn is_meta_transaction(code: u32) -> bool {
    matches!(
        code,
        PING_TRANSACTION | INTERFACE_TRANSACTION | DUMP_TRANSACTION
    )
}

/// A capability to invoke an object that may live elsewhere.
///
/// Holding a handle never transfers ownership of the object behind it.
pub trait RemoteObject: Send + Sync {
    /// Descriptor of the interface the object implements.
    fn interface_descriptor(&self) -> &str;

    /// Deliver a request tagged with `code`.
    ///
    /// On success the stub's reply has been moved into `reply`. On failure
    /// `reply` must be discarded.
    ///
    /// # Errors
    ///
    /// Returns the transport status of the call.
    fn send_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()>;

    /// Whether the handle refers to an object outside this endpoint.
    fn is_proxy_object(&self) -> bool {
        true
    }

    /// Whether the object behind the handle has died.
    fn is_object_dead(&self) -> bool {
        false
    }

    /// Register a recipient to be told when the object dies.
    ///
    /// Returns `false` when the object is already dead or does not support
    /// death notification.
    fn add_death_recipient(&self, _recipient: Arc<dyn DeathRecipient>) -> bool {
        false
    }

    /// Remove a recipient previously added. Identity is pointer identity.
    fn remove_death_recipient(&self, _recipient: &Arc<dyn DeathRecipient>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_codes_match_wire_values() {
        assert_eq!(PING_TRANSACTION, 0x5f50_4e47);
        assert_eq!(INTERFACE_TRANSACTION, 0x5f4e_5446);
        assert_eq!(DUMP_TRANSACTION, 0x5f44_4d50);
    }

    #[test]
    fn test_meta_codes_outside_call_range() {
        for code in [PING_TRANSACTION, INTERFACE_TRANSACTION, DUMP_TRANSACTION] {
            assert!(is_meta_transaction(code));
            assert!(code > LAST_CALL_TRANSACTION);
        }
        assert!(!is_meta_transaction(FIRST_CALL_TRANSACTION));
    }
}
