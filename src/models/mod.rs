pub mod key;

pub use key::{ConfigBlock, KeyFiles, KeyRecord};
