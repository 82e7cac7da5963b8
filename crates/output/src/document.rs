//! JSON writers for records, animation metadata and rig documents.

use std::fs;
use std::path::Path;

use serde::Serialize;
use spriteforge_core::compose::AnimationMeta;
use spriteforge_core::{DescriptiveRecord, EngineError, ExchangeRecord};
use tracing::debug;

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| EngineError::Io(format!("serializing {}: {e}", path.display())))?;
    fs::write(path, text + "\n").map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Writes the descriptive record as pretty-printed JSON.
pub fn write_record(record: &DescriptiveRecord, path: &Path) -> Result<(), EngineError> {
    write_json(record, path)
}

/// Writes the sheet's frame rectangles and clips as pretty-printed JSON.
pub fn write_animation(animation: &AnimationMeta, path: &Path) -> Result<(), EngineError> {
    write_json(animation, path)
}

/// Writes a Spine or DragonBones document.
pub fn write_rig(rig: &ExchangeRecord, path: &Path) -> Result<(), EngineError> {
    write_json(rig, path)
}
