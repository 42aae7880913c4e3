pub mod idx;
pub mod utils;
