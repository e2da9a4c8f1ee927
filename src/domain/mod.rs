mod course;
mod ranking;
mod score;
mod student;

pub use course::*;
pub use ranking::*;
pub use score::*;
pub use student::*;
