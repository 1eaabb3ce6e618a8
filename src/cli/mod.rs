pub mod run;
pub mod summary;

pub use run::*;
pub use summary::*;
