use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};

use camino::Utf8Path;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tempfile::Builder;

use crate::error::IngestError;

fn is_gzip(path: &Utf8Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Opens `path` for buffered reading, decompressing `.gz` files.
pub fn open_reader(path: &Utf8Path) -> io::Result<Box<dyn Read>> {
    let file = File::open(path.as_std_path())?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(
            file,
        )))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Writes `path` through a temporary file in the same directory and renames
/// it into place, so readers never observe a partial output. `.gz` paths are
/// gzip-compressed.
pub fn write_atomic<F>(path: &Utf8Path, write: F) -> Result<(), IngestError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| IngestError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = Builder::new()
        .prefix(".ncov-ingest")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| IngestError::Filesystem(err.to_string()))?;

    {
        let mut buffered = BufWriter::new(temp.as_file_mut());
        let result = if is_gzip(path) {
            let mut encoder = GzEncoder::new(&mut buffered, Compression::default());
            write(&mut encoder).and_then(|_| encoder.finish().map(|_| ()))
        } else {
            write(&mut buffered)
        };
        result
            .and_then(|_| buffered.flush())
            .map_err(|err| IngestError::Output(format!("{path}: {err}")))?;
    }

    temp.persist(path.as_std_path())
        .map_err(|err| IngestError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}
