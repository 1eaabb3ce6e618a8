pub mod chunk;
pub mod stream;
pub mod transform;

pub use chunk::*;
pub use stream::*;
pub use transform::*;
