use thiserror::Error;

/// Errors that can occur while dissecting cartridge data.
///
/// The taxonomy is flat: every reader in the workspace surfaces one of
/// these kinds unchanged to its caller. There are no retries and no
/// partial successes.
#[derive(Debug, Error)]
pub enum NitroError {
    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input ended before a required field could be read
    #[error("Input truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// A fixed signature did not match
    #[error("Bad magic value")]
    BadMagic,

    /// Structural invariants of the cartridge header failed
    #[error("Cartridge header failed validation")]
    BadHeader,

    /// Header CRC check was requested and failed
    #[error("Header CRC-16 mismatch: expected {expected:#06x}, got {actual:#06x}")]
    BadCrc { expected: u16, actual: u16 },

    /// A file id exceeded the FAT entry count
    #[error("File id {id} exceeds FAT entry count {max}")]
    BadIndex { id: u32, max: u32 },

    /// The overlay table was malformed
    #[error("Bad overlay table: {0}")]
    BadOverlay(&'static str),

    /// An LZSS back-reference pointed before the start of output
    #[error("Back-reference displacement {disp} exceeds {produced} bytes of output")]
    BadReference { disp: usize, produced: usize },

    /// LZ11 streams cannot be decoded in overlay mode
    #[error("LZ11 is not supported in overlay mode")]
    UnsupportedMode,

    /// Compressed input ran out before the declared output size
    #[error("Compressed stream ended after {produced} of {declared} bytes")]
    ShortOutput { produced: usize, declared: usize },

    /// A declared archive size did not match the input length
    #[error("Archive size field says {declared} bytes, input is {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    /// A declared entry range escapes the input
    #[error("Entry range escapes the input")]
    OutOfBounds,

    /// Directory nesting exceeded the recursion limit
    #[error("Directory nesting exceeded {0} levels")]
    TooDeep(usize),

    /// No entry with the requested path exists
    #[error("No such path: {0}")]
    NotFound(String),
}
