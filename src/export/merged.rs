use super::ensure_parent;
use crate::error::Result;
use photo_merge_common::MergedRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 統合結果をJSON配列（整形済み）で書き出す
pub fn write_merged_json(records: &[MergedRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
