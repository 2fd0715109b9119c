//! Utilities for working with CSV files.

use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

pub struct CsvWriter {
    writer: BufWriter<File>,
}
impl CsvWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes a raw line verbatim, for `#`-style comments ahead of the header.
    pub fn comment(&mut self, line: &str) -> Result<(), io::Error> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all("\n".as_bytes())?;
        Ok(())
    }

    pub fn append<R>(&mut self, record: R) -> Result<(), io::Error>
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut first = true;
        for datum in record.into_iter() {
            if first {
                first = false;
            } else {
                self.writer.write_all(",".as_bytes())?;
            }
            let str: &str = datum.as_ref();
            self.writer.write_all(str.as_bytes())?;
        }
        self.writer.write_all("\n".as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), io::Error> {
        self.writer.flush()
    }
}

/// A line-oriented CSV reader. Blank lines and lines whose first non-blank
/// character is `#` are skipped.
pub struct CsvReader {
    lines: Lines<BufReader<File>>,
}
impl CsvReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        let lines = BufReader::new(file).lines();
        Ok(Self { lines })
    }

    pub fn read(&mut self) -> Option<Result<Vec<String>, io::Error>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(Ok(line.split(',').map(ToString::to_string).collect()));
        }
    }
}

impl Iterator for CsvReader {
    type Item = Result<Vec<String>, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("willow-csv-{name}-{}", std::process::id()))
    }

    #[test]
    fn round_trip_skipping_comments_and_blanks() {
        let path = temp_path("round-trip");
        {
            let mut writer = CsvWriter::create(&path).unwrap();
            writer.comment("# a comment").unwrap();
            writer.append(["alpha", "beta"]).unwrap();
            writer.comment("").unwrap();
            writer.append(["gamma"]).unwrap();
            writer.flush().unwrap();
        }
        let records: Vec<_> = CsvReader::open(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(
            vec![
                vec!["alpha".to_string(), "beta".to_string()],
                vec!["gamma".to_string()]
            ],
            records
        );
    }
}
