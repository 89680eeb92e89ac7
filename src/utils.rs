use std::{
    collections::HashSet,
    io::{self, BufRead, Write},
};

use crate::types::Track;

/// Prints `prompt` without a newline and reads one line from stdin.
///
/// The trailing line terminator is removed; all other whitespace is kept so
/// callers can compare the answer exactly.
pub fn read_line(prompt: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(strip_line_ending(&line).to_string())
}

/// Removes one trailing `\n` or `\r\n`, nothing else.
pub fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

/// Drops re-releases of a recording that was already seen.
///
/// Two tracks are the same recording when name, set of artist ids and
/// duration in seconds all match. The first occurrence wins, so the order of
/// `tracks` decides which release is kept.
pub fn remove_duplicate_recordings(tracks: &mut Vec<Track>) {
    let mut seen = HashSet::new();
    tracks.retain(|track| seen.insert(track.recording_key()));
}
