pub mod analyzer;
pub mod config;
pub mod ict;
pub mod indicators;
pub mod levels;
pub mod synthesizer;


pub use analyzer::*;
pub use config::*;
pub use ict::*;
pub use indicators::*;
pub use levels::*;
pub use synthesizer::*;
