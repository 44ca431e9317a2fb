// =============================================================================
// SAVE.RS — numbered save slots
//
// Slot `n` lives at `<save_dir>/save<n>` and holds the raw bytes of one
// plain-old-data value.
// =============================================================================

use std::path::{Path, PathBuf};

use bytemuck::Pod;
use log::{debug, warn};

use super::FsError;

pub fn save_path(save_dir: &Path, slot: u32) -> PathBuf {
    save_dir.join(format!("save{slot}"))
}

/// The first `len` bytes of `slot`. Longer saves are cut to `len`; shorter
/// ones read as missing.
pub fn read_save_bytes(save_dir: &Path, slot: u32, len: usize) -> Option<Vec<u8>> {
    let path = save_path(save_dir, slot);
    match std::fs::read(&path) {
        Ok(mut bytes) if bytes.len() >= len => {
            bytes.truncate(len);
            Some(bytes)
        }
        Ok(bytes) => {
            warn!("[fs] {} holds {} bytes, expected at least {len}", path.display(), bytes.len());
            None
        }
        Err(_) => None,
    }
}

pub fn write_save_bytes(save_dir: &Path, slot: u32, data: &[u8]) -> Result<(), FsError> {
    std::fs::create_dir_all(save_dir)?;
    let path = save_path(save_dir, slot);
    std::fs::write(&path, data)?;
    debug!("[fs] wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

pub fn read_save<T: Pod>(save_dir: &Path, slot: u32) -> Option<T> {
    let bytes = read_save_bytes(save_dir, slot, std::mem::size_of::<T>())?;
    Some(bytemuck::pod_read_unaligned(&bytes))
}

pub fn write_save<T: Pod>(save_dir: &Path, slot: u32, value: &T) -> Result<(), FsError> {
    write_save_bytes(save_dir, slot, bytemuck::bytes_of(value))
}
