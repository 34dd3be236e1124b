//! Ability scheduler interface.
//!
//! The ability manager drives every ability through its scheduler: it
//! moves the ability between lifecycle states, connects and disconnects
//! services, and for data abilities forwards inserts, updates, deletes,
//! queries and batches of operations.
//!
//! | Interface | Descriptor | Server | Client |
//! |-----------|------------|--------|--------|
//! | scheduler | `ohos.aafwk.AbilityScheduler` | [`AbilitySchedulerStub`] | [`AbilitySchedulerProxy`] |
//! | observer | `ohos.aafwk.DataAbilityObserver` | [`DataAbilityObserverStub`] | [`DataAbilityObserverProxy`] |
//!
//! Lifecycle calls are one-way. Data calls wait for a reply; a missing
//! required argument or an oversized batch is refused with an
//! invalid-value status before the [`AbilityScheduler`] is called.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod code;
pub mod data;
pub mod lifecycle;
pub mod observer;
pub mod prelude;
pub mod proxy;
pub mod recipient;
pub mod scheduler;
pub mod stub;

pub use code::{AbilitySchedulerCode, DataAbilityObserverCode};
pub use data::{
    DataAbilityOperation, DataAbilityPredicates, DataAbilityResult, OperationType, ResultSet,
    ValueObject, ValuesBucket,
};
pub use lifecycle::{AbilityLifecycleState, LifeCycleStateInfo, WindowCommand};
pub use observer::{
    DATA_ABILITY_OBSERVER_DESCRIPTOR, DataAbilityObserver, DataAbilityObserverProxy,
    DataAbilityObserverStub,
};
pub use proxy::AbilitySchedulerProxy;
pub use recipient::AbilitySchedulerRecipient;
pub use scheduler::AbilityScheduler;
pub use stub::{ABILITY_SCHEDULER_DESCRIPTOR, AbilitySchedulerStub};
