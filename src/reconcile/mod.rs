pub mod placement;
pub mod record;
pub mod resolver;

pub use placement::{NavigationContext, PlacementTarget, StorageTable};
pub use record::{
    CustomsStatus, LifecycleStatus, LocationUpdate, NewVehicleRecord, PreviousLocation,
    StoredVehicle, VehicleDraft,
};
pub use resolver::{ReconciliationOutcome, ReconciliationResolver, RecordStore, StoreError};
