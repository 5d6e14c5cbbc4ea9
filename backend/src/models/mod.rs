//! Contract types exchanged with the estate API.

#[macro_use]
pub mod macros;

pub mod gate;
pub mod pass;

crate::define_id_type!(GateId);
crate::define_id_type!(VisitorId);
crate::define_id_type!(PassId);
crate::define_id_type!(ResidencyId);

pub use gate::{GateEvent, GateRef, GateStatus, GateStatusMap, VisitorGateStatus};
pub use pass::{
    ApiResponse, CheckinStatus, GatePassCheckinResponse, GatePassSnapshot, OwnerSnapshot,
    ResidencySnapshot, Visitor,
};
