use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, InfoArgs, ReportFormat};
use crate::report::{FileReport, FrameReport, Position, TagReport, VbrReport};
use mpa::process::file::MpaFile;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, _multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing MPEG audio file: {}", args.input.display());

    let file = MpaFile::open_with(&args.input, cli.options())?;
    let report = FileReport::from_file(&file);

    match args.format {
        ReportFormat::Plain => display_report(&report),
        ReportFormat::Yaml => print!("{}", report.to_yaml()?),
    }

    Ok(())
}

fn display_report(report: &FileReport) {
    println!();
    println!("MPEG Audio Information");
    println!("======================");
    println!();

    display_tags(&report.tags);
    display_frame(&report.first_frame);
    if let Some(vbr) = &report.vbr {
        display_vbr(vbr);
    }

    println!("Summary");
    println!(
        "  Audio range               {}..{} ({} bytes)",
        report.audio_begin,
        report.audio_end,
        report.audio_end - report.audio_begin
    );
    println!(
        "  Average data rate         {:.1} kbps",
        f64::from(report.bytes_per_second) * 8.0 / 1000.0
    );
    println!("  Duration                  {}", report.length);
    println!();
}

fn display_tags(tags: &[TagReport]) {
    println!("Tags");
    if tags.is_empty() {
        println!("  None");
    }

    for tag in tags {
        let position = match tag.position {
            Position::Start => "start",
            Position::End => "end",
        };
        println!(
            "  {:<10} {:<7} {} bytes at {} ({position})",
            tag.tag_type, tag.version, tag.size, tag.offset
        );
        if !tag.details.is_empty() {
            println!("    {}", tag.details.join(", "));
        }
    }
    println!();
}

fn display_frame(frame: &FrameReport) {
    println!("First Frame");
    println!("  Offset                    {}", frame.offset);
    println!("  Size                      {} bytes", frame.size);
    println!("  Format                    {} {}", frame.version, frame.layer);
    println!("  Bitrate                   {} kbps", frame.bitrate_kbps);
    println!("  Sampling rate             {} Hz", frame.sample_rate);
    println!("  Channel mode              {}", frame.channel_mode);
    println!("  Samples per frame         {}", frame.samples_per_frame);
    println!("  CRC protected             {}", frame.crc);
    println!("  Emphasis                  {}", frame.emphasis);
    println!();
}

fn display_vbr(vbr: &VbrReport) {
    println!("VBR Header ({})", vbr.header_type);
    println!("  Frames                    {}", vbr.frames);
    println!("  Bytes                     {}", vbr.bytes);

    if let Some(lame) = &vbr.lame {
        println!("  Encoder                   {} ({})", lame.encoder, lame.version);
        if let Some(method) = &lame.vbr_method {
            println!("  VBR method                {method}");
        }
        if let (Some(delay), Some(padding)) = (lame.encoder_delay, lame.encoder_padding) {
            println!("  Encoder delay/padding     {delay}/{padding} samples");
        }
    }
    println!();
}
