//! Line classification for layer files
//!
//! Every text line falls into exactly one [`LineKind`]. Binary layer blocks
//! are detected on the raw bytes before any text handling happens, see
//! [`is_block_open`] and [`is_block_close`].

use serde::{Deserialize, Serialize};

/// Marker that opens an embedded layer block
pub const BLOCK_OPEN: &[u8] = b"{{";

/// Marker that closes an embedded layer block
pub const BLOCK_CLOSE: &[u8] = b"}}";

/// Header field carried by a `;X:<int>` comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderField {
    /// `;W:` raster width
    Width,
    /// `;H:` raster height
    Height,
    /// `;L:` declared layer count
    LayerCount,
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
            Self::LayerCount => write!(f, "layer count"),
        }
    }
}

/// Classification of a single text line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Zero-length line
    Empty,
    /// Header comment carrying an integer value
    Header(HeaderField),
    /// Any other `;` comment
    Comment,
    /// `G4 ` dwell
    Dwell,
    /// `G1 ` linear move
    LinearMove,
    /// Any other G- or M-code; contributes no time
    OtherCommand,
    /// Unknown leading character
    Unrecognized(char),
}

/// Classify a text line by its leading characters, case-insensitively
pub fn classify(line: &str) -> LineKind {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return LineKind::Empty;
    };

    match first.to_ascii_uppercase() {
        ';' => match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('W') => LineKind::Header(HeaderField::Width),
            Some('H') => LineKind::Header(HeaderField::Height),
            Some('L') => LineKind::Header(HeaderField::LayerCount),
            _ => LineKind::Comment,
        },
        'G' => {
            let rest = chars.as_str();
            if rest.starts_with("4 ") {
                LineKind::Dwell
            } else if rest.starts_with("1 ") {
                LineKind::LinearMove
            } else {
                LineKind::OtherCommand
            }
        }
        'M' => LineKind::OtherCommand,
        other => LineKind::Unrecognized(other),
    }
}

/// Extract the integer value of a header comment
///
/// All `;` characters are removed, the line is split on `:` and the second
/// field is parsed as a signed integer.
pub fn header_value(line: &str) -> Result<i32, std::num::ParseIntError> {
    let cleaned = line.replace(';', "");
    // A missing field parses as "" and fails like any other bad value.
    let field = cleaned.split(':').nth(1).unwrap_or("");
    field.trim().parse::<i32>()
}

/// Whether a raw line opens an embedded layer block
pub fn is_block_open(raw: &[u8]) -> bool {
    raw.starts_with(BLOCK_OPEN)
}

/// Whether a raw line closes an embedded layer block
pub fn is_block_close(raw: &[u8]) -> bool {
    raw.starts_with(BLOCK_CLOSE)
}
