mod range;
mod slice;
mod status;

pub use range::KeyRange;
pub use slice::Slice;
pub use status::{Code, Result, Status};
