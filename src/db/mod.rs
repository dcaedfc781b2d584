#[allow(clippy::module_inception)]
mod db;
mod options;

pub use db::DB;
pub use options::{DBOptions, ReadOptions, WriteOptions};
