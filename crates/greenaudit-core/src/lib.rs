pub mod grade;
pub mod recommend;
pub mod score;

pub use grade::*;
pub use recommend::*;
pub use score::*;
