use std::io::{Read, Seek};

pub mod bytes;
pub mod error;
pub mod region;
pub mod util;

pub use error::NitroError;
pub use region::Region;

/// Result type used throughout the nitrofs crates.
pub type Result<T> = std::result::Result<T, NitroError>;

/// A reader that implements both Read and Seek.
///
/// This is the byte-source abstraction every archive reader consumes.
/// The source is owned (or mutably borrowed) by the caller for the
/// lifetime of any archive opened from it.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}
