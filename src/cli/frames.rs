use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::{Cli, FramesArgs};
use crate::timestamp::time_str;
use mpa::process::file::{FrameRequest, MpaFile};
use mpa::structs::frame::MpaFrame;
use mpa::utils::stream::ByteStream;

#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    bytes: u64,
    seconds: f64,
    resyncs: u64,
    crc_checked: u64,
    crc_errors: u64,
}

impl FrameStats {
    fn add(&mut self, frame: &MpaFrame, previous: Option<&MpaFrame>) {
        self.frames += 1;
        self.bytes += u64::from(frame.size);
        self.seconds +=
            f64::from(frame.header.samples_per_frame()) / f64::from(frame.header.sample_rate);

        if let Some(previous) = previous.filter(|previous| previous.end() != frame.offset) {
            log::warn!(
                "Resynced from {} to {} ({} bytes skipped)",
                previous.end(),
                frame.offset,
                frame.offset.abs_diff(previous.end())
            );
            self.resyncs += 1;
        }
    }
}

pub fn cmd_frames(args: &FramesArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Walking frames of {}", args.input.display());

    let mut file = MpaFile::open_with(&args.input, cli.options())?;

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Walking frames...");
            Some(pb)
        }
        None => None,
    };

    let stats = walk(&mut file, args, pb.as_ref())?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    println!("Frame Summary");
    println!("  Frames                    {}", stats.frames);
    println!("  Audio bytes               {}", stats.bytes);
    println!("  Duration                  {}", time_str(stats.seconds));
    if stats.seconds > 0.0 {
        println!(
            "  Average data rate         {:.1} kbps",
            stats.bytes as f64 * 8.0 / (stats.seconds * 1000.0)
        );
    }
    println!("  Resyncs                   {}", stats.resyncs);
    if args.crc {
        println!(
            "  CRC errors                {} of {} protected frames",
            stats.crc_errors, stats.crc_checked
        );
    }
    println!();

    Ok(())
}

fn walk<S: ByteStream>(
    file: &mut MpaFile<S>,
    args: &FramesArgs,
    pb: Option<&ProgressBar>,
) -> Result<FrameStats> {
    let mut stats = FrameStats::default();
    let mut previous: Option<MpaFrame> = None;
    let mut current = file.frame(FrameRequest::First)?;

    while let Some(frame) = current {
        if args.limit.is_some_and(|limit| stats.frames >= limit) {
            break;
        }

        stats.add(&frame, previous.as_ref());

        if args.crc && frame.header.crc_present {
            stats.crc_checked += 1;
            if !file.check_crc(&frame)? {
                log::warn!("CRC mismatch in frame at {}", frame.offset);
                stats.crc_errors += 1;
            }
        }

        if args.verbose_frames {
            let line = format!("{:>8}  {frame}", stats.frames - 1);
            match pb {
                Some(pb) => pb.suspend(|| println!("{line}")),
                None => println!("{line}"),
            }
        }

        if stats.frames.is_multiple_of(100) {
            if let Some(pb) = pb {
                pb.set_message(format!("Walking frames...         {}", stats.frames));
            }
        }

        previous = Some(frame);
        current = file.frame(FrameRequest::Next(&frame))?;
    }

    Ok(stats)
}
