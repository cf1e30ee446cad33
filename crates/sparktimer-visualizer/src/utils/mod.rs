//! Utility modules

pub mod file_io;

pub use file_io::{count_lines_in, read_line_bytes, LayerFileReader};
