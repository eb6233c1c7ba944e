pub mod error;
pub mod pairs;
pub mod traits;
pub mod types;

pub use error::*;
pub use pairs::*;
pub use traits::*;
pub use types::*;
