use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use caption_align::AlignedCaption;

pub fn captions_path(dir: &Path, case_id: &str) -> PathBuf {
    dir.join(format!("{case_id}.captions.json"))
}

/// Writes the renderer-facing caption array for one case.
pub fn write_captions(dir: &Path, case_id: &str, captions: &[AlignedCaption]) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|err| {
        format!(
            "Failed to create captions output directory '{}': {err}",
            dir.display()
        )
    })?;

    let path = captions_path(dir, case_id);
    let mut file = File::create(&path)
        .map_err(|err| format!("Failed to create captions file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, captions).map_err(|err| {
        format!(
            "Failed to serialize captions JSON '{}': {err}",
            path.display()
        )
    })?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize captions file '{}': {err}", path.display()))?;
    Ok(())
}
