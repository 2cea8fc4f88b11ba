//! Domain models for the AgriGoo farm pipeline

mod alert;
mod detection;
mod farm;
mod reading;
mod soil;
mod threshold;
mod weather;

pub use alert::*;
pub use detection::*;
pub use farm::*;
pub use reading::*;
pub use soil::*;
pub use threshold::*;
pub use weather::*;
