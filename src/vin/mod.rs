pub mod code;
pub mod decoder;
pub mod extractor;
pub mod tables;

pub use code::{IdentificationCode, ValidationError, CODE_LENGTH};
pub use decoder::{DecodedVehicle, Decoder, VehicleCategory, UNKNOWN_MANUFACTURER};
pub use extractor::{extract_code, ExtractionError, MIN_TEXT_LENGTH};
