//! Readers and writers for log fragments and merged streams.
//!
//! Both types own the codec together with the file underneath it, so every
//! exit path releases both handles.

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::CloseError;
use crate::patterns::{is_compressed, LogStream, GZ_EXTENSION};

/// A fragment opened for reading, inflated transparently when its name ends
/// in `.gz`.
pub enum FragmentReader {
    Plain(BufReader<File>),
    // Rotated gzip files may hold several members back to back.
    Gzip(MultiGzDecoder<BufReader<File>>),
}

impl FragmentReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = BufReader::new(File::open(path)?);
        let compressed = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_compressed);
        if compressed {
            Ok(FragmentReader::Gzip(MultiGzDecoder::new(file)))
        } else {
            Ok(FragmentReader::Plain(file))
        }
    }
}

impl Read for FragmentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FragmentReader::Plain(r) => r.read(buf),
            FragmentReader::Gzip(r) => r.read(buf),
        }
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Output of a merge: `stdout_all`/`stderr_all`, optionally gzip-compressed.
pub struct MergedWriter {
    path: PathBuf,
    sink: Sink,
}

impl MergedWriter {
    /// Create (or truncate) the merged output of `stream` inside `dir`.
    pub fn create(dir: &Path, stream: LogStream, compress: bool) -> io::Result<Self> {
        let path = merged_path(dir, stream, compress);
        let file = File::create(&path)?;
        Ok(Self::from_file(path, file, compress))
    }

    /// Wrap an already opened `file`, reported as `path`.
    pub(crate) fn from_file(path: PathBuf, file: File, compress: bool) -> Self {
        let file = BufWriter::new(file);
        let sink = if compress {
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        };
        Self { path, sink }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finish the compressed stream and flush the file to disk.
    ///
    /// The file is flushed even when finishing the encoder fails, and both
    /// failures are reported.
    pub fn finish(self) -> Result<PathBuf, (PathBuf, CloseError)> {
        let mut err = CloseError::default();
        match self.sink {
            Sink::Plain(mut w) => err.file = close_file(&mut w).err(),
            Sink::Gzip(mut enc) => {
                err.encoder = enc.try_finish().err();
                err.file = close_file(enc.get_mut()).err();
            }
        }
        if err.is_empty() {
            Ok(self.path)
        } else {
            Err((self.path, err))
        }
    }
}

impl Write for MergedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Path of the merged output of `stream` in `dir`.
pub fn merged_path(dir: &Path, stream: LogStream, compress: bool) -> PathBuf {
    if compress {
        dir.join(format!("{}.{}", stream.merged_name(), GZ_EXTENSION))
    } else {
        dir.join(stream.merged_name())
    }
}

fn close_file(w: &mut BufWriter<File>) -> io::Result<()> {
    w.flush()?;
    w.get_ref().sync_all()
}
