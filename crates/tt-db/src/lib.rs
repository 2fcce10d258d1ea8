//! Storage layer for the time tracker.
//!
//! A sheet is persisted as a JSON object keyed by date, each value listing
//! that day's times in chronological order, alternating start and end:
//!
//! ```json
//! {
//!   "2018-09-01": [
//!     "10:00",
//!     "12:00"
//!   ]
//! }
//! ```
//!
//! Keys and values are written with the configured [`Formats`]. Keys are
//! emitted in ascending order, which is chronological for the default ISO
//! date format. Days without times are never written, and an empty array is
//! read the same as a missing key.
//!
//! # Concurrency
//!
//! [`SheetFile`] assumes a single process owns the data file for the
//! duration of a load/modify/save cycle. It does no locking.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tt_core::{Formats, Sheet};

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Reading the serialized sheet failed.
    #[error("failed to read sheet: {0}")]
    Read(#[source] io::Error),
    /// The data is not a JSON object of string arrays.
    #[error("malformed sheet data: {0}")]
    Decode(#[source] serde_json::Error),
    /// A date key or time value does not match the configured formats.
    #[error("invalid entry {date:?} {time:?}: {source}")]
    InvalidEntry {
        date: String,
        time: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Writing the serialized sheet failed.
    #[error("failed to write sheet: {0}")]
    Encode(#[source] io::Error),
    /// Opening, creating or replacing the data file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

type DateTimes = BTreeMap<String, Vec<String>>;

/// Reads a sheet from `reader`.
///
/// Empty input yields an empty sheet. Any malformed value fails the whole
/// load; no partial sheet is returned.
pub fn load<R: Read>(mut reader: R, formats: &Formats) -> Result<Sheet, DbError> {
    let mut content = String::new();
    reader.read_to_string(&mut content).map_err(DbError::Read)?;
    if content.trim().is_empty() {
        return Ok(Sheet::new());
    }

    let days: DateTimes = serde_json::from_str(&content).map_err(DbError::Decode)?;

    let mut times = Vec::with_capacity(days.values().map(Vec::len).sum());
    for (date, values) in &days {
        for time in values {
            let ts = formats
                .parse_entry(date, time)
                .map_err(|source| DbError::InvalidEntry {
                    date: date.clone(),
                    time: time.clone(),
                    source,
                })?;
            times.push(ts);
        }
    }
    times.sort();

    Ok(Sheet::from_times(times))
}

/// Writes `sheet` to `writer` as pretty-printed JSON followed by a newline.
pub fn save<W: Write>(mut writer: W, sheet: &Sheet, formats: &Formats) -> Result<(), DbError> {
    let mut days = DateTimes::new();
    for ts in sheet.times() {
        days.entry(formats.format_key(ts))
            .or_default()
            .push(formats.format_time(ts));
    }

    serde_json::to_writer_pretty(&mut writer, &days).map_err(|e| DbError::Encode(e.into()))?;
    writeln!(writer).map_err(DbError::Encode)?;
    writer.flush().map_err(DbError::Encode)
}

/// A sheet stored at a fixed path.
#[derive(Debug, Clone)]
pub struct SheetFile {
    path: PathBuf,
    formats: Formats,
}

impl SheetFile {
    /// Binds a data file path to the formats used to read and write it.
    ///
    /// The file is not touched until [`load`](Self::load) or
    /// [`save`](Self::save) is called.
    pub fn open(path: impl Into<PathBuf>, formats: Formats) -> Self {
        Self {
            path: path.into(),
            formats,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    /// Loads the sheet; a missing file is an empty sheet.
    pub fn load(&self) -> Result<Sheet, DbError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no data file, starting empty");
                return Ok(Sheet::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let sheet = load(BufReader::new(file), &self.formats)?;
        tracing::debug!(path = %self.path.display(), times = sheet.len(), "loaded sheet");
        Ok(sheet)
    }

    /// Saves the sheet, replacing the file in one rename.
    ///
    /// Missing parent directories are created. The sheet is first written to
    /// a temporary file next to the target, which is removed if anything fails.
    pub fn save(&self, sheet: &Sheet) -> Result<(), DbError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
                parent
            }
            None => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        save(BufWriter::new(tmp.as_file()), sheet, &self.formats)?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        tracing::debug!(path = %self.path.display(), times = sheet.len(), "saved sheet");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> DbError {
        DbError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tt_core::Timestamp;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }

    /// Accepts `limit` bytes, then fails every write and flush.
    struct FailingWriter {
        limit: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.limit);
            self.limit -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.limit == 0 {
                return Err(io::Error::other("disk full"));
            }
            Ok(())
        }
    }

    fn at(date: &str, time: &str) -> Timestamp {
        Formats::default().parse_entry(date, time).unwrap()
    }

    fn load_str(data: &str) -> Result<Sheet, DbError> {
        load(data.as_bytes(), &Formats::default())
    }

    fn save_string(sheet: &Sheet) -> String {
        let mut out = Vec::new();
        save(&mut out, sheet, &Formats::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn load_empty_input_is_empty_sheet() {
        assert!(load_str("").unwrap().is_empty());
        assert!(load_str("  \n").unwrap().is_empty());
    }

    #[test]
    fn load_empty_object_is_empty_sheet() {
        assert!(load_str("{}").unwrap().is_empty());
    }

    #[test]
    fn load_empty_day_is_same_as_missing_day() {
        let sheet = load_str(r#"{"2018-09-01": []}"#).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn load_rejects_malformed_json() {
        let err = load_str(r#"{"2018-09-01": ["10:00""#).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));

        let err = load_str(r#"{"2018-09-01": "10:00"}"#).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }

    #[test]
    fn load_rejects_invalid_date() {
        let err = load_str(r#"{"2018-13-01": ["10:00"]}"#).unwrap_err();
        match err {
            DbError::InvalidEntry { date, time, .. } => {
                assert_eq!(date, "2018-13-01");
                assert_eq!(time, "10:00");
            }
            other => panic!("expected InvalidEntry, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_invalid_time() {
        let err = load_str(r#"{"2018-09-01": ["10:00", "noon"]}"#).unwrap_err();
        assert!(matches!(err, DbError::InvalidEntry { ref time, .. } if time == "noon"));
        assert!(err.to_string().starts_with(r#"invalid entry "2018-09-01" "noon""#));
    }

    #[test]
    fn load_one_day_start_end_start() {
        let sheet = load_str(r#"{"2018-09-01": ["10:00", "12:00", "13:00"]}"#).unwrap();
        assert_eq!(
            sheet.times(),
            &[
                at("2018-09-01", "10:00"),
                at("2018-09-01", "12:00"),
                at("2018-09-01", "13:00"),
            ]
        );
    }

    #[test]
    fn load_sorts_times_chronologically() {
        let sheet = load_str(r#"{"2018-09-02": ["08:00"], "2018-09-01": ["12:00", "10:00"]}"#)
            .unwrap();
        assert_eq!(
            sheet.times(),
            &[
                at("2018-09-01", "10:00"),
                at("2018-09-01", "12:00"),
                at("2018-09-02", "08:00"),
            ]
        );
    }

    #[test]
    fn load_reports_reader_failure() {
        let err = load(FailingReader, &Formats::default()).unwrap_err();
        assert!(matches!(err, DbError::Read(_)));
        assert_eq!(err.to_string(), "failed to read sheet: disk gone");
    }

    #[test]
    fn save_reports_writer_failure() {
        let sheet = Sheet::from_times(vec![at("2018-09-01", "10:00")]);

        for limit in [0, 5] {
            let err = save(FailingWriter { limit }, &sheet, &Formats::default()).unwrap_err();
            assert!(matches!(err, DbError::Encode(_)), "limit {limit}: {err:?}");
        }
    }

    #[test]
    fn save_empty_sheet_is_empty_object() {
        assert_eq!(save_string(&Sheet::new()), "{}\n");
    }

    #[test]
    fn save_first_start() {
        let sheet = Sheet::from_times(vec![at("2018-09-01", "10:00")]);
        assert_eq!(save_string(&sheet), "{\n  \"2018-09-01\": [\n    \"10:00\"\n  ]\n}\n");
    }

    #[test]
    fn save_multiple_days_in_key_order() {
        let sheet = Sheet::from_times(vec![
            at("2018-09-01", "10:00"),
            at("2018-09-01", "12:00"),
            at("2018-09-02", "08:00"),
        ]);

        insta::assert_snapshot!(save_string(&sheet), @r#"
        {
          "2018-09-01": [
            "10:00",
            "12:00"
          ],
          "2018-09-02": [
            "08:00"
          ]
        }
        "#);
    }

    #[test]
    fn save_then_load_returns_same_sheet() {
        let mut sheet = Sheet::new();
        sheet.start(at("2018-09-01", "10:00")).unwrap();
        sheet.end(at("2018-09-01", "12:00")).unwrap();
        sheet.start(at("2018-09-01", "13:00")).unwrap();
        sheet.start(at("2018-09-02", "08:00")).unwrap();

        let saved = save_string(&sheet);
        assert_eq!(load_str(&saved).unwrap(), sheet);
    }

    #[test]
    fn custom_formats_are_used_for_keys_and_values() {
        let formats = Formats::new("%d.%m.%Y", "%d.%m.%Y", "%H:%M:%S").unwrap();
        let sheet = load(r#"{"01.09.2018": ["10:00:30"]}"#.as_bytes(), &formats).unwrap();

        let mut out = Vec::new();
        save(&mut out, &sheet, &formats).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n  \"01.09.2018\": [\n    \"10:00:30\"\n  ]\n}\n"
        );
    }

    #[test]
    fn sheet_file_missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let file = SheetFile::open(temp.path().join("tt.json"), Formats::default());

        assert!(file.load().unwrap().is_empty());
        assert!(!file.path().exists());
    }

    #[test]
    fn sheet_file_round_trip_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/dir/tt.json");
        let file = SheetFile::open(&path, Formats::default());
        let sheet = Sheet::from_times(vec![at("2018-09-01", "10:00")]);

        file.save(&sheet).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"2018-09-01\": [\n    \"10:00\"\n  ]\n}\n"
        );
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
        assert_eq!(file.load().unwrap(), sheet);
    }

    #[test]
    fn sheet_file_failed_save_leaves_no_temp_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tt.json");
        fs::create_dir(&path).unwrap();
        let file = SheetFile::open(&path, Formats::default());

        let err = file
            .save(&Sheet::from_times(vec![at("2018-09-01", "10:00")]))
            .unwrap_err();

        assert!(matches!(err, DbError::Io { .. }), "{err:?}");
        let entries: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("tt.json")]);
    }

    #[test]
    fn sheet_file_reports_decode_errors() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tt.json");
        fs::write(&path, "not json").unwrap();

        let err = SheetFile::open(&path, Formats::default()).load().unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }
}
