//! Convenience re-exports for ability schedulers and their clients.

pub use crate::code::AbilitySchedulerCode;
pub use crate::data::{
    DataAbilityOperation, DataAbilityPredicates, DataAbilityResult, OperationType, ResultSet,
    ValueObject, ValuesBucket,
};
pub use crate::lifecycle::{AbilityLifecycleState, LifeCycleStateInfo, WindowCommand};
pub use crate::observer::{DataAbilityObserver, DataAbilityObserverProxy, DataAbilityObserverStub};
pub use crate::proxy::AbilitySchedulerProxy;
pub use crate::recipient::AbilitySchedulerRecipient;
pub use crate::scheduler::AbilityScheduler;
pub use crate::stub::{ABILITY_SCHEDULER_DESCRIPTOR, AbilitySchedulerStub};
