pub mod association;
pub mod paper;
pub mod search_string;

pub use association::*;
pub use paper::*;
pub use search_string::*;
