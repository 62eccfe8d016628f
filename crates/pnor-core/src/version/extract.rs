//! Version partition extraction

use crate::error::{Error, Result};
use crate::tool::{FlashTool, Pnor};
use log::{debug, error};
use std::fs;
use std::path::Path;

/// Magic at the start of a signed container (0x17082011, big endian)
pub const SIGNED_MAGIC: [u8; 4] = [0x17, 0x08, 0x20, 0x11];

/// Size of the signed container header preceding the payload
pub const SIGNED_HEADER_SIZE: usize = 4096;

/// File name of the partition dump inside the scratch directory
const DUMP_NAME: &str = "version";

/// Decode the version text from a raw version partition image
///
/// A signed container's 4 KiB header is skipped. The text ends at the
/// first NUL or at end of data, and invalid UTF-8 is replaced rather than
/// rejected.
pub fn decode_version(data: &[u8]) -> String {
    let body = if data.starts_with(&SIGNED_MAGIC) {
        data.get(SIGNED_HEADER_SIZE..).unwrap_or_default()
    } else {
        data
    };
    let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
    String::from_utf8_lossy(&body[..end]).into_owned()
}

/// Read and decode the version partition
///
/// The partition is dumped into a fresh scratch directory which is removed
/// before returning, whatever the outcome. Removal failures are logged.
pub fn read_version<T: FlashTool>(pnor: &Pnor<T>, partition: &str) -> Result<String> {
    let dir = tempfile::Builder::new()
        .prefix("version")
        .tempdir()
        .map_err(Error::TempDir)?;
    let dir_path = dir.path().to_path_buf();

    let result = dump_and_decode(pnor, partition, &dir_path.join(DUMP_NAME));

    if let Err(e) = dir.close() {
        error!("Failed to remove temp dir {}: {}", dir_path.display(), e);
    }
    result
}

fn dump_and_decode<T: FlashTool>(pnor: &Pnor<T>, partition: &str, dump: &Path) -> Result<String> {
    pnor.read_partition(partition, dump)?;
    let data = fs::read(dump).map_err(|e| Error::ImageRead {
        path: dump.to_path_buf(),
        source: e,
    })?;
    debug!("Read {} bytes from {}", data.len(), partition);
    Ok(decode_version(&data))
}

/// Read the version partition, degrading every failure to an empty string
pub fn extract_version<T: FlashTool>(pnor: &Pnor<T>, partition: &str) -> String {
    read_version(pnor, partition).unwrap_or_else(|e| {
        error!("Failed to read {}: {}", partition, e);
        String::new()
    })
}
