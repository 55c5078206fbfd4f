//! Crop reference data: yields, prices, tenors, growing periods and
//! weather sensitivities

mod catalog;
pub mod loader;

pub use catalog::{CropCatalog, CropInfo};
pub use loader::DEFAULT_CROPS_PATH;
