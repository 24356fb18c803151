pub mod companies;
pub mod project;
pub mod reconcile;
pub mod serve;
pub mod util;

pub use companies::*;
pub use project::*;
pub use reconcile::*;
pub use serve::*;
pub use util::*;
