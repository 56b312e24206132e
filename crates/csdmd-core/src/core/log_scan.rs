use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Phrase printed by the run flow once the simulation has finished.
pub const COMPLETION_MARKER: &str = "MD simulation has completed";

/// Line printed by the run flow on success. Always contains [`COMPLETION_MARKER`].
pub const COMPLETION_LINE: &str = "MD simulation has completed successfully.";

/// Case-insensitive substring search for `needle` in a single line of text.
pub fn line_contains(line: &str, needle: &str) -> bool {
    line.to_lowercase().contains(&needle.to_lowercase())
}

/// Returns `true` if any line of `text` contains the completion marker.
pub fn contains_completion_marker(text: &str) -> bool {
    text.lines().any(|line| line_contains(line, COMPLETION_MARKER))
}

/// Scans a log file line by line for `needle`.
///
/// Lines that are not valid UTF-8 are decoded lossily instead of aborting the
/// scan, since child processes are free to write arbitrary bytes.
pub fn scan_file(path: &Path, needle: &str) -> io::Result<bool> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(false);
        }
        if line_contains(&String::from_utf8_lossy(&buffer), needle) {
            return Ok(true);
        }
    }
}
