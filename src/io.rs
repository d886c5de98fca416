use crate::records::CleanRecord;
use anyhow::{Context, Result};
use csv::{DeserializeRecordsIntoIter, ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const READ_BUFFER_BYTES: usize = 2 * 1024 * 1024;

// ====== INPUT RESOLUTION ======

/// Finds `<stem>.csv` in `dir`, falling back to `<stem>.csv.gz`.
pub fn resolve_input(dir: &Path, stem: &str) -> Option<PathBuf> {
    [format!("{stem}.csv"), format!("{stem}.csv.gz")]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER_BYTES,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_BYTES, file)))
    }
}

// ====== CHUNKED READER ======

/// Reads a CSV file as typed rows, at most `chunk_size` at a time.
///
/// Rows that fail to deserialize come back as `Err` inside the chunk so the
/// caller can count them. I/O failures end the read with an error.
pub struct ChunkReader<T> {
    rows: DeserializeRecordsIntoIter<Box<dyn Read>, T>,
    chunk_size: usize,
    path: PathBuf,
    chunks_read: u64,
}

impl<T: DeserializeOwned> ChunkReader<T> {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(open_source(path)?);
        Ok(Self {
            rows: reader.into_deserialize(),
            chunk_size: chunk_size.max(1),
            path: path.to_path_buf(),
            chunks_read: 0,
        })
    }

    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    pub fn next_chunk(&mut self) -> Result<Option<Vec<Result<T, csv::Error>>>> {
        let mut chunk = Vec::with_capacity(self.chunk_size.min(64 * 1024));
        for row in self.rows.by_ref() {
            match row {
                Err(err) if err.is_io_error() => {
                    return Err(err).with_context(|| format!("reading {}", self.path.display()));
                }
                row => chunk.push(row),
            }
            if chunk.len() >= self.chunk_size {
                break;
            }
        }

        if chunk.is_empty() {
            return Ok(None);
        }
        self.chunks_read += 1;
        debug!(
            "Read chunk {} of {} rows from {}",
            self.chunks_read,
            chunk.len(),
            self.path.display()
        );
        Ok(Some(chunk))
    }
}

// ====== CLEAN WRITER ======

/// Writes one clean CSV. The header is written up front so an empty result
/// is still a well-formed file.
pub struct CleanWriter {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
    rows: u64,
}

impl CleanWriter {
    pub fn create<R: CleanRecord>(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        writer
            .write_record(R::HEADER)
            .with_context(|| format!("writing header to {}", path.display()))?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn write<R: CleanRecord>(&mut self, record: &R) -> Result<()> {
        self.writer
            .serialize(record)
            .with_context(|| format!("writing to {}", self.path.display()))?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))
    }

    /// Flushes and returns the number of data rows written.
    pub fn finish(mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.rows)
    }
}

// ====== MEMORY MONITORING ======
pub fn memory_usage() -> String {
    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        for line in status.lines() {
            if line.starts_with("VmRSS:") {
                return line.to_string();
            }
        }
    }
    "Memory info unavailable".to_string()
}
