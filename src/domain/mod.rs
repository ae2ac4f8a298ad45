pub mod detection;
pub mod errors;
pub mod model;
pub mod palette;
pub mod stats;
pub mod upload;
