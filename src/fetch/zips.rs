// src/fetch/zips.rs

use reqwest::Client;
use std::{
    fs::{self, File},
    io::{Read, Seek, Write},
    path::Path,
    time::Duration,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use url::Url;
use zip::ZipArchive;

use super::get_bytes;
use crate::error::{Error, Result};
use crate::parse::{parse_csv, Record};

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: usize = 64 << 20;

/// Buffer to reserve for an entry whose header claims `declared` bytes.
fn prealloc(declared: u64) -> usize {
    usize::try_from(declared).unwrap_or(usize::MAX).min(MAX_PREALLOC)
}

/// Read the first entry of a zip archive as text.
pub fn read_first_entry<R: Read + Seek>(reader: R) -> Result<(String, String)> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| Error::invalid(format!("not a zip archive: {}", e)))?;
    if archive.len() == 0 {
        return Err(Error::invalid("zip archive is empty"));
    }
    let mut entry = archive.by_index(0)?;
    let name = entry.name().to_string();
    let mut buf = Vec::with_capacity(prealloc(entry.size()));
    entry.read_to_end(&mut buf)?;
    debug!(entry = %name, bytes = buf.len(), "read first zip entry");
    Ok((name, String::from_utf8_lossy(&buf).into_owned()))
}

/// Download the zipped end-of-day report at `url` and parse the CSV inside it.
///
/// The archive goes to a uniquely named temporary file that is removed before
/// returning, whatever the outcome. When `save` is given the raw archive is also
/// copied there.
#[instrument(level = "info", skip(client, save), fields(url = %url))]
pub async fn fetch_report(
    client: &Client,
    url: &Url,
    timeout: Duration,
    required: &str,
    save: Option<&Path>,
) -> Result<Vec<Record>> {
    fetch_report_in(client, url, timeout, required, save, &std::env::temp_dir()).await
}

/// `fetch_report` with the temporary archive placed under `tmp_dir`.
pub(crate) async fn fetch_report_in(
    client: &Client,
    url: &Url,
    timeout: Duration,
    required: &str,
    save: Option<&Path>,
    tmp_dir: &Path,
) -> Result<Vec<Record>> {
    let bytes = get_bytes(client, url, timeout).await?;

    let mut tmp = NamedTempFile::new_in(tmp_dir)?;
    tmp.write_all(&bytes)?;
    tmp.flush()?;
    drop(bytes);

    if let Some(dest) = save {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::copy(tmp.path(), dest)?;
        info!(dest = %dest.display(), "saved archive");
    }

    let required = required.to_string();
    tokio::task::spawn_blocking(move || -> Result<Vec<Record>> {
        let file = File::open(tmp.path())?;
        let (name, text) = read_first_entry(file)?;
        let records = parse_csv(&text, Some(&required))?;
        debug!(entry = %name, rows = records.len(), "parsed report");
        tmp.close()?;
        Ok(records)
    })
    .await?
}

/// Build an in-memory zip archive from `(name, content)` pairs.
#[cfg(test)]
pub(crate) fn zipped(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Cursor;
    use zip::{write::FileOptions, CompressionMethod, ZipWriter};

    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}
