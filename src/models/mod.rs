mod profile;
mod property;
mod transaction;

pub use profile::*;
pub use property::*;
pub use transaction::*;
