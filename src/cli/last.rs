use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, LastArgs};
use mpa::process::file::{FrameRequest, MpaFile};

pub fn cmd_last(args: &LastArgs, cli: &Cli, _multi: Option<&MultiProgress>) -> Result<()> {
    let mut file = MpaFile::open_with(&args.input, cli.options())?;

    let Some(last) = file.frame(FrameRequest::Last)? else {
        println!("No frame found before the end of the audio.");
        return Ok(());
    };
    println!("Last frame                  {last}");

    match file.frame(FrameRequest::Prev(&last))? {
        Some(prev) => println!("Previous frame              {prev}"),
        None => println!("Previous frame              none"),
    }

    if last.end() != file.end() {
        log::warn!(
            "{} bytes between the last frame and the end of the audio",
            file.end() - last.end()
        );
    }

    Ok(())
}
