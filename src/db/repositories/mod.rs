pub mod vehicles;

pub use vehicles::VehicleRepository;
