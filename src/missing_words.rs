use itertools::Itertools;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::scorer::normalize;

/// Write `words` one per line, alphabetically sorted and deduplicated
pub fn write_missing_words<I, S, W>(words: I, writer: &mut W) -> std::io::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    let mut count = 0;
    for word in words
        .into_iter()
        .map(|w| w.as_ref().to_lowercase())
        .sorted()
        .dedup()
    {
        writeln!(writer, "{word}")?;
        count += 1;
    }
    Ok(count)
}

/// Export to a text file; an empty list leaves the filesystem untouched
pub fn save_missing_words<P, I, S>(path: P, words: I) -> crate::Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let words: Vec<S> = words.into_iter().collect();
    if words.is_empty() {
        return Ok(0);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_missing_words(words, &mut writer)?;
    writer.flush()?;
    Ok(count)
}

/// Read a previously exported list back into a word set
pub fn load_missing_words<P: AsRef<Path>>(path: P) -> crate::Result<BTreeSet<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().flat_map(normalize).collect())
}
