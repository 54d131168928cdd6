use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use uuid::Uuid;

const MAGIC: &[u8; 4] = b"CSIM";
const VERSION: u32 = 1;

/// On-disk layout of the listmode stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Header followed by little-endian `f64` records
    #[default]
    Binary,
    /// One whitespace-separated line per record
    Text,
}

/// Header of a binary listmode stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub run_id: Uuid,
    pub detectors: u32,
    pub fields: u32,
}

impl BinaryHeader {
    /// Values per record
    pub fn width(&self) -> usize {
        self.detectors as usize * self.fields as usize
    }
}

/// Appends fixed-width records to an output stream.
///
/// Only the coordinating thread writes, so records are never interleaved.
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    width: usize,
    records: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Start a stream of records with `detectors * fields` values each
    pub fn new(
        mut out: W,
        format: OutputFormat,
        run_id: Uuid,
        detectors: usize,
        fields: usize,
    ) -> io::Result<Self> {
        if format == OutputFormat::Binary {
            out.write_all(MAGIC)?;
            out.write_all(&VERSION.to_le_bytes())?;
            out.write_all(run_id.as_bytes())?;
            out.write_all(&(detectors as u32).to_le_bytes())?;
            out.write_all(&(fields as u32).to_le_bytes())?;
        }
        Ok(Self {
            out,
            format,
            width: detectors * fields,
            records: 0,
        })
    }

    /// Values per record
    pub fn width(&self) -> usize {
        self.width
    }

    /// Records appended so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Append one complete record. Short input is zero-padded and long
    /// input truncated so every record has the stream's width.
    pub fn append(&mut self, values: &[f64]) -> io::Result<()> {
        let padding = std::iter::repeat(0.0).take(self.width.saturating_sub(values.len()));
        let row = values.iter().copied().take(self.width).chain(padding);
        match self.format {
            OutputFormat::Binary => {
                for v in row {
                    self.out.write_all(&v.to_le_bytes())?;
                }
            }
            OutputFormat::Text => {
                let line = row.map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
                writeln!(self.out, "{}", line)?;
            }
        }
        self.records += 1;
        Ok(())
    }

    /// Flush and hand back the underlying stream
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

fn read_u32<R: Read>(input: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read back a binary listmode stream
pub fn read_binary<R: Read>(mut input: R) -> io::Result<(BinaryHeader, Vec<Vec<f64>>)> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not a listmode stream"));
    }
    let version = read_u32(&mut input)?;
    if version != VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported listmode version {}", version),
        ));
    }
    let mut id = [0u8; 16];
    input.read_exact(&mut id)?;
    let header = BinaryHeader {
        run_id: Uuid::from_bytes(id),
        detectors: read_u32(&mut input)?,
        fields: read_u32(&mut input)?,
    };

    let mut body = Vec::new();
    input.read_to_end(&mut body)?;
    let record_bytes = header.width() * 8;
    if record_bytes == 0 {
        return Ok((header, Vec::new()));
    }
    if body.len() % record_bytes != 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "truncated record"));
    }
    let records = body
        .chunks_exact(record_bytes)
        .map(|chunk| {
            chunk
                .chunks_exact(8)
                .map(|b| {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(b);
                    f64::from_le_bytes(bytes)
                })
                .collect()
        })
        .collect();
    Ok((header, records))
}
