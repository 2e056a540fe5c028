use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, SeekArgs};
use crate::timestamp::time_str;
use mpa::process::file::MpaFile;
use mpa::utils::stream::ByteStream;

pub fn cmd_seek(args: &SeekArgs, cli: &Cli, _multi: Option<&MultiProgress>) -> Result<()> {
    if !(0.0..=100.0).contains(&args.percent) {
        anyhow::bail!("Seek position must be 0-100 %, got {}", args.percent);
    }

    let file = MpaFile::open_with(&args.input, cli.options())?;
    let (offset, source) = seek_offset(&file, args.percent);

    println!(
        "{:.2} % ({}) -> byte {offset} ({source})",
        args.percent,
        time_str(file.length_seconds() * f64::from(args.percent) / 100.0),
    );

    Ok(())
}

/// Offset from the VBR table, or linear over the audio for CBR files.
fn seek_offset<S: ByteStream>(file: &MpaFile<S>, percent: f32) -> (u64, &'static str) {
    if let Some(offset) = file.seek_position(percent) {
        let source = file.vbr_header().map_or("VBR", |vbr| vbr.name());
        return (offset, source);
    }

    let first = file.first_frame().offset;
    let span = (file.end() - first) as f64;
    (first + (span * f64::from(percent) / 100.0) as u64, "linear")
}
