pub mod delegated;

pub use crate::datasets::delegated::*;
