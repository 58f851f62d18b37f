pub mod vehicle;

pub use vehicle::{VehicleMove, VehicleRecord};
