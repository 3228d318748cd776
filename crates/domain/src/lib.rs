pub mod errors;
pub mod filter;
pub mod stats;
pub mod todo;

pub use errors::*;
pub use filter::*;
pub use stats::*;
pub use todo::*;
