use crate::errors::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default output path for a given suffix/extension, derived from an
/// input path's stem (text before the first period).
pub fn get_default_out_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let mut out_path: PathBuf = input.to_path_buf();
    let file_stem = input.file_stem().unwrap_or_default().to_str().unwrap_or("");
    let file_prefix = match file_stem.find('.') {
        Some(period_idx) => &file_stem[..period_idx],
        None => file_stem,
    };
    out_path.set_file_name(format!("{file_prefix}.{suffix}.{ext}"));
    out_path
}

/// Writes to a temporary path alongside `path`, then renames into place,
/// so that a write failure partway through never leaves a partial file at
/// the final path.
pub fn write_atomically<F>(path: &Path, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp_path = temp_path_for(path);
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    write_fn(&mut writer)?;
    writer.flush()?;
    drop(writer);
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
