//! Writers for drained queue contents.
//!
//! Each record pairs a queue index with the message popped from it.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error type for serialization operations
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One message popped from one queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueRecord {
    pub queue: usize,
    pub message: Value,
}

impl QueueRecord {
    /// Build a record from an encoded message as it sat on the queue.
    pub fn from_encoded(queue: usize, encoded: &str) -> Result<Self, SerializationError> {
        Ok(Self {
            queue,
            message: serde_json::from_str(encoded)?,
        })
    }
}

/// Output layout for drained records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Ndjson,
    /// A single JSON array.
    JsonArray,
}

/// NDJSON (Newline Delimited JSON) writer
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single record as an NDJSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> Result<(), SerializationError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(record)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        writeln!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Write `records` to `writer` in the requested format.
pub fn write_records<W: Write>(
    writer: W,
    records: &[QueueRecord],
    format: OutputFormat,
) -> Result<(), SerializationError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = NdjsonWriter::new(writer);
            out.write_all(records)?;
            out.flush()
        }
        OutputFormat::JsonArray => {
            let mut out = JsonArrayWriter::new(writer)?;
            for record in records {
                out.write(record)?;
            }
            out.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<QueueRecord> {
        vec![
            QueueRecord::from_encoded(0, r#"{"_special":"a"}"#).unwrap(),
            QueueRecord::from_encoded(3, r#"{"n":-24}"#).unwrap(),
        ]
    }

    #[test]
    fn test_ndjson_writer() {
        let mut buf = Vec::new();
        write_records(&mut buf, &records(), OutputFormat::Ndjson).unwrap();

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"queue":0,"message":{"_special":"a"}}"#);
        assert_eq!(lines[1], r#"{"queue":3,"message":{"n":-24}}"#);
    }

    #[test]
    fn test_json_array_writer() {
        let mut buf = Vec::new();
        write_records(&mut buf, &records(), OutputFormat::JsonArray).unwrap();

        let output: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            output,
            json!([
                {"queue": 0, "message": {"_special": "a"}},
                {"queue": 3, "message": {"n": -24}}
            ])
        );
    }

    #[test]
    fn test_empty_json_array() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[], OutputFormat::JsonArray).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]\n");
    }

    #[test]
    fn test_record_from_bad_encoding() {
        assert!(matches!(
            QueueRecord::from_encoded(1, "not json"),
            Err(SerializationError::JsonError(_))
        ));
    }
}
