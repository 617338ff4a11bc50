pub mod enums;
pub mod follow;
pub mod models;
pub mod validation;

pub use enums::*;
pub use follow::*;
pub use models::*;
pub use validation::*;
