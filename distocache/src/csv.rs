use crate::CacheError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Line oriented comma separated reader with no quoting rules.
pub struct CsvFileReader;

impl CsvFileReader {
    /// Splits every non-empty line of `path` on `,`. An empty path yields no rows.
    pub fn rows(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>, CacheError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut rows = Vec::new();
        for line in reader.split(b'\n') {
            let line = String::from_utf8_lossy(&line?).replace('\r', "");
            if !line.is_empty() {
                rows.push(line.split(',').map(str::to_owned).collect());
            }
        }
        Ok(rows)
    }
}
