mod composer;
mod confirm;
mod help;
mod search;
mod utils;

pub use composer::*;
pub use confirm::*;
pub use help::*;
pub use search::*;
pub use utils::centered_rect;
