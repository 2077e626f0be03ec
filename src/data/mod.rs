/// Decoded HAM records
pub mod ham;
/// Shared winnow parsing and byte writing helpers
pub mod parser_utils;
/// Decoded VHAM records and the expansion's index boundaries
pub mod vham;

use std::io::Write;

use crate::data::ham::HamFile;
use crate::data::vham::VHamFile;
use crate::error::ErrorKind;

/// Name and kind of a bitmap in the game's PIG file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapInfo {
    pub name: String,
    /// Animated bitmaps are frames of a clip (`name#N`) and never carry a
    /// usable plain texture name.
    pub is_animated: bool,
}

/// Lookup into the bitmap library that accompanies a HAM file.
pub trait BitmapResolver {
    /// Info for bitmap `id`, or `None` if the library has no such bitmap.
    fn bitmap_info(&self, id: u16) -> Option<BitmapInfo>;
    /// Bitmap id for a texture name. Unknown names resolve to bitmap 0.
    fn bitmap_id_from_name(&self, name: &str) -> u16;
}

/// Raw record decoding and encoding for HAM files.
///
/// `decode` must leave `input` positioned right after the record arrays so
/// the editor's trailing chunks can be scanned from there.
pub trait BaseFileCodec {
    fn decode(&self, input: &mut &[u8]) -> Result<HamFile, ErrorKind>;
    fn encode(&self, file: &HamFile, out: &mut dyn Write) -> Result<(), ErrorKind>;
}

/// Raw record decoding and encoding for VHAM files.
pub trait ExtensionFileCodec {
    fn decode(&self, input: &mut &[u8]) -> Result<VHamFile, ErrorKind>;
    fn encode(&self, file: &VHamFile, out: &mut dyn Write) -> Result<(), ErrorKind>;
}
