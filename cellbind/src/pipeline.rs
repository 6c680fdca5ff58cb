//! Whole-file runs: decode, map every row, resolve messages.
//!
//! A [`Pipeline`] keeps the mapping, the chain builder and the message
//! resolver. Each run builds a fresh [`RecordMapper`], so unique
//! constraints never leak values from one file into the next.
//!
//! # Example
//!
//! ```rust,ignore
//! use cellbind::{config::Settings, mapping::example_mapping, pipeline::Pipeline};
//!
//! let pipeline = Pipeline::new(example_mapping(), &Settings::from_env()?);
//! let report = pipeline.read_file("customers.csv", None)?;
//! for message in &report.messages {
//!     eprintln!("{}", message.message);
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::config::Settings;
use crate::error::PipelineResult;
use crate::locale::Locale;
use crate::logs::{log_info, log_success, log_warning};
use crate::mapping::{ChainBuilder, ChainOverride, MappingConfig, RecordMapper};
use crate::parser::{self, CsvRowSink, CsvRowSource, DecodedInput};
use crate::validation::{MessageBundle, MessageResolver, MessageStore, ResolvedMessage};

/// How the input was read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Outcome of reading a whole file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReport {
    /// One JSON object per valid row.
    pub records: Vec<Value>,
    /// Resolved failures of the invalid rows, by row then column.
    pub messages: Vec<ResolvedMessage>,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub csv_info: CsvInfo,
}

impl ReadReport {
    pub fn is_valid(&self) -> bool {
        self.invalid_count == 0
    }
}

pub struct Pipeline {
    mapping: MappingConfig,
    builder: ChainBuilder,
    resolver: MessageResolver,
}

impl Pipeline {
    pub fn new(mapping: MappingConfig, settings: &Settings) -> Self {
        Self {
            mapping,
            builder: ChainBuilder::new(settings.build_options()),
            resolver: MessageResolver::new(MessageStore::builtin(), settings.message_locale.clone()),
        }
    }

    pub fn with_override(mut self, chain_override: impl ChainOverride + 'static) -> Self {
        self.builder.register(chain_override);
        self
    }

    /// Add message templates for a locale on top of the built-in ones.
    pub fn with_messages(mut self, locale: Locale, bundle: MessageBundle) -> Self {
        self.resolver.store_mut().extend(locale, bundle);
        self
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }

    pub fn resolver(&self) -> &MessageResolver {
        &self.resolver
    }

    /// Build the chains of the mapping for one pass.
    pub fn mapper(&self) -> PipelineResult<RecordMapper> {
        Ok(RecordMapper::new(&self.mapping, &self.builder)?)
    }

    /// Read a file, detecting its encoding and, unless given, its delimiter.
    pub fn read_file<P: AsRef<Path>>(
        &self,
        path: P,
        delimiter: Option<char>,
    ) -> PipelineResult<ReadReport> {
        log_info(format!("Reading {}", path.as_ref().display()));
        let input = parser::read_file(path, delimiter.or(self.mapping.delimiter))?;
        self.read_decoded(input)
    }

    pub fn read_bytes(&self, bytes: &[u8], delimiter: Option<char>) -> PipelineResult<ReadReport> {
        let input = parser::decode_bytes(bytes, delimiter.or(self.mapping.delimiter))?;
        self.read_decoded(input)
    }

    /// Read decoded text.
    ///
    /// Invalid rows are reported, not returned as records. A row wider
    /// than a strict mapping allows ends the run.
    pub fn read_decoded(&self, input: DecodedInput) -> PipelineResult<ReadReport> {
        log_info(format!(
            "Encoding: {}, delimiter: '{}'",
            input.encoding,
            format_delimiter(input.delimiter)
        ));

        let mut mapper = self.mapper()?;
        let mut source =
            CsvRowSource::from_text(&input.content, input.delimiter, self.mapping.has_headers)?;
        let headers = source.headers().map(<[String]>::to_vec).unwrap_or_default();

        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut row_count = 0;
        let mut invalid_count = 0;

        for row in source.by_ref() {
            let row = row?;
            row_count += 1;
            let outcome = mapper.read_row(&row)?;
            if outcome.is_valid() {
                records.push(outcome.record.to_json());
            } else {
                invalid_count += 1;
                failures.extend(outcome.failures);
            }
        }

        let messages = self.resolver.resolve_all(&failures);
        if invalid_count > 0 {
            log_warning(format!("{} of {} rows are invalid", invalid_count, row_count));
        } else {
            log_success(format!("All {} rows are valid", row_count));
        }

        Ok(ReadReport {
            valid_count: records.len(),
            records,
            messages,
            invalid_count,
            csv_info: CsvInfo {
                encoding: input.encoding,
                delimiter: input.delimiter,
                headers,
                row_count,
            },
        })
    }

    /// Write JSON records as CSV, header first when the mapping has one.
    ///
    /// Stops at the first record a write chain rejects.
    pub fn write<W: Write>(
        &self,
        records: &[Value],
        writer: W,
        delimiter: Option<char>,
    ) -> PipelineResult<W> {
        let delimiter = delimiter.or(self.mapping.delimiter).unwrap_or(',');
        let mut mapper = self.mapper()?;
        let mut sink = CsvRowSink::new(writer, delimiter)?;

        let mut row_number = 0;
        if self.mapping.has_headers {
            sink.write_header(&self.mapping.header())?;
            row_number += 1;
        }

        for value in records {
            row_number += 1;
            let record = mapper.record_from_json(value)?;
            let cells = mapper.write_record(&record, row_number)?;
            sink.write_row(&cells)?;
        }

        log_success(format!("Wrote {} rows", sink.rows_written()));
        Ok(sink.into_inner()?)
    }
}

pub fn format_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
