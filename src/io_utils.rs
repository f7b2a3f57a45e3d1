use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::error::{EvalError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Compression applied to a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Zstd,
}

impl Codec {
    fn sniff(buf: &[u8]) -> Self {
        if buf.starts_with(&GZIP_MAGIC) {
            Codec::Gzip
        } else if buf.starts_with(&ZSTD_MAGIC) {
            Codec::Zstd
        } else {
            Codec::Plain
        }
    }

    /// Picks the codec for an output file from its extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Codec::Gzip,
            Some("zst") => Codec::Zstd,
            _ => Codec::Plain,
        }
    }

    /// Detects the codec of an existing file from its leading bytes.
    pub fn detect(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|source| EvalError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut br = BufReader::new(f);
        Ok(Codec::sniff(br.fill_buf()?))
    }
}

/// Opens a record file for reading, decoding gzip or zstd transparently.
/// `-` reads from stdin.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    if path == Path::new("-") {
        return Ok(decode(BufReader::new(io::stdin()))?);
    }
    let f = File::open(path).map_err(|source| EvalError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode(BufReader::new(f))?)
}

fn decode<R: BufRead + 'static>(mut br: R) -> io::Result<Box<dyn BufRead>> {
    let codec = Codec::sniff(br.fill_buf()?);
    Ok(match codec {
        Codec::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(br))),
        Codec::Zstd => Box::new(BufReader::new(zstd::stream::read::Decoder::with_buffer(br)?)),
        Codec::Plain => Box::new(br),
    })
}

/// Buffered writer that compresses according to its codec.
/// Call [`OutputWriter::finish`] to flush trailers before the file is used.
pub enum OutputWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
}

impl OutputWriter {
    pub fn new(file: File, codec: Codec) -> io::Result<Self> {
        let w = BufWriter::new(file);
        Ok(match codec {
            Codec::Plain => OutputWriter::Plain(w),
            Codec::Gzip => OutputWriter::Gzip(GzEncoder::new(w, flate2::Compression::default())),
            Codec::Zstd => OutputWriter::Zstd(zstd::stream::write::Encoder::new(w, 0)?),
        })
    }

    pub fn finish(self) -> io::Result<()> {
        let mut w = match self {
            OutputWriter::Plain(w) => w,
            OutputWriter::Gzip(enc) => enc.finish()?,
            OutputWriter::Zstd(enc) => enc.finish()?,
        };
        w.flush()
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::Plain(w) => w.write(buf),
            OutputWriter::Gzip(w) => w.write(buf),
            OutputWriter::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::Plain(w) => w.flush(),
            OutputWriter::Gzip(w) => w.flush(),
            OutputWriter::Zstd(w) => w.flush(),
        }
    }
}

/// Creates (or truncates) `path`, compressing by extension.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<OutputWriter> {
    let path = path.as_ref();
    let f = File::create(path).map_err(|source| EvalError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(OutputWriter::new(f, Codec::from_path(path))?)
}
