//! CSV row source and row sink.
//!
//! Tokenizing is left to the `csv` crate; this module only decodes input
//! bytes, guesses the delimiter and numbers the rows handed to the mapper.

use encoding_rs::Encoding;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::logs::{log_debug, log_warning};
use crate::models::RawRow;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
pub const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Decoded input with the settings used to read it.
#[derive(Debug, Clone)]
pub struct DecodedInput {
    pub content: String,
    pub encoding: String,
    pub delimiter: char,
}

/// Guess the encoding of raw bytes.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, confidence, _) = chardet::detect(bytes);
    log_debug(format!("Detected charset '{}' ({:.2})", charset, confidence));

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "shift_jis" | "sjis" | "cp932" => "shift_jis".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with an encoding label.
///
/// Malformed sequences are replaced and reported as a warning.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let encoding = Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| CsvError::Encoding(encoding.to_string()))?;
    let (content, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        log_warning(format!("Input contains bytes invalid in {}", used.name()));
    }
    Ok(content.into_owned())
}

/// Pick the delimiter occurring most often in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or_default();

    let mut best = DELIMITERS[0];
    let mut best_count = 0;
    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Decode bytes, detecting the encoding and (unless given) the delimiter.
pub fn decode_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<DecodedInput> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyInput);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    Ok(DecodedInput {
        content,
        encoding,
        delimiter,
    })
}

/// Read and decode a file.
pub fn read_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<DecodedInput> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_bytes(&bytes, delimiter)
}

fn delimiter_byte(delimiter: char) -> CsvResult<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CsvError::Encoding(format!("non-ASCII delimiter '{}'", delimiter)))
}

/// Yields numbered rows from CSV text.
///
/// Rows may have any number of cells; the mapper decides what a short or
/// long row means. Blank lines are skipped.
pub struct CsvRowSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Option<Vec<String>>,
    row_number: usize,
}

impl<'a> CsvRowSource<&'a [u8]> {
    pub fn from_text(content: &'a str, delimiter: char, has_headers: bool) -> CsvResult<Self> {
        Self::new(content.as_bytes(), delimiter, has_headers)
    }
}

impl<R: Read> CsvRowSource<R> {
    /// Wrap a reader. With `has_headers` the first record is taken as the
    /// header row and still counts as row 1.
    pub fn new(reader: R, delimiter: char, has_headers: bool) -> CsvResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut row_number = 0;
        let headers = if has_headers {
            let mut record = csv::StringRecord::new();
            if !reader.read_record(&mut record)? {
                return Err(CsvError::EmptyInput);
            }
            row_number = 1;
            Some(record.iter().map(|h| h.trim().to_string()).collect())
        } else {
            None
        };

        Ok(Self {
            reader,
            headers,
            row_number,
        })
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Rows produced so far, header included.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    fn next_row(&mut self) -> CsvResult<Option<RawRow>> {
        let mut record = csv::StringRecord::new();
        if !self.reader.read_record(&mut record)? {
            return Ok(None);
        }
        self.row_number += 1;
        let line_number = record.position().map_or(self.row_number, |p| p.line() as usize);
        let cells = record.iter().map(str::to_string).collect();
        Ok(Some(RawRow::new(line_number, self.row_number, cells)))
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = CsvResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Writes one CSV record per mapped row; absent cells become empty.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvRowSink<W> {
    pub fn new(writer: W, delimiter: char) -> CsvResult<Self> {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .from_writer(writer);
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_header(&mut self, header: &[String]) -> CsvResult<()> {
        self.writer.write_record(header)?;
        Ok(())
    }

    pub fn write_row(&mut self, cells: &[Option<String>]) -> CsvResult<()> {
        self.writer
            .write_record(cells.iter().map(|c| c.as_deref().unwrap_or_default()))?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> CsvResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> CsvResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| CsvError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn rows(content: &str, delimiter: char, has_headers: bool) -> Vec<RawRow> {
        CsvRowSource::from_text(content, delimiter, has_headers)
            .unwrap()
            .collect::<CsvResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_rows_are_numbered_after_header() {
        let mut source = CsvRowSource::from_text("id;name\n1;Alice\n2;Bob\n", ';', true).unwrap();
        assert_eq!(source.headers(), Some(&["id".to_string(), "name".to_string()][..]));

        let first = source.next().unwrap().unwrap();
        assert_eq!((first.line_number, first.row_number), (2, 2));
        assert_eq!(first.cells, vec!["1", "Alice"]);

        let second = source.next().unwrap().unwrap();
        assert_eq!(second.row_number, 3);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_flexible_rows() {
        let rows = rows("a,b,c\n1\n1,2,3,4\n", ',', false);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells, vec!["1"]);
        assert_eq!(rows[2].cells.len(), 4);
        assert_eq!(rows[0].row_number, 1);
    }

    #[test]
    fn test_multiline_quoted_cell_keeps_line_numbers() {
        let rows = rows("id,note\n1,\"two\nlines\"\n2,plain\n", ',', true);
        assert_eq!(rows[0].cells[1], "two\nlines");
        assert_eq!(rows[0].line_number, 2);
        assert_eq!((rows[1].line_number, rows[1].row_number), (4, 3));
    }

    #[test]
    fn test_empty_input_with_headers() {
        assert!(matches!(
            CsvRowSource::from_text("", ';', true),
            Err(CsvError::EmptyInput)
        ));
        assert!(rows("", ';', false).is_empty());
    }

    #[test]
    fn test_sink_writes_absent_as_empty() {
        let mut sink = CsvRowSink::new(Vec::new(), ';').unwrap();
        sink.write_header(&["id".to_string(), "name".to_string()]).unwrap();
        sink.write_row(&[Some("1".to_string()), None]).unwrap();
        sink.write_row(&[Some("2".to_string()), Some("a;b".to_string())]).unwrap();
        assert_eq!(sink.rows_written(), 2);

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "id;name\n1;\n2;\"a;b\"\n");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ';');
    }

    #[test]
    fn test_decode_latin1() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1").unwrap(), "Société");
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            decode_content(b"abc", "klingon"),
            Err(CsvError::Encoding(_))
        ));
    }

    #[test]
    fn test_read_file_detects_delimiter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id,amount\n1,10\n").unwrap();

        let input = read_file(file.path(), None).unwrap();
        assert_eq!(input.delimiter, ',');
        assert_eq!(input.encoding, "utf-8");

        let input = read_file(file.path(), Some(';')).unwrap();
        assert_eq!(input.delimiter, ';');
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(CsvRowSink::new(Vec::new(), '€').is_err());
    }
}
