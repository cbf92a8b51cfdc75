//! Domain models for the herdbook system.

mod animal;
mod gestation;
mod health;
mod milk;
mod pasture;
mod validation;

pub use animal::*;
pub use gestation::*;
pub use health::*;
pub use milk::*;
pub use pasture::*;
pub use validation::*;
