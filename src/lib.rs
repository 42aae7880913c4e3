pub mod config;
pub mod convert;
pub mod datasets;

pub use config::ConvertConfig;
pub use convert::{idx_to_images, images_to_idx, inspect, ConvertError};
pub use datasets::idx::{decode, encode, IdxError, IdxHeader, IdxImages, Image};
