// vidprobe-cli/src/commands/fetch.rs
//
// The `fetch-tools` subcommand: provisions a local ffmpeg installation
// with a progress bar while the build package downloads.

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use vidprobe_core::FfmpegProvisioner;

use crate::cli::FetchToolsArgs;

pub fn run_fetch_tools(args: &FetchToolsArgs) -> anyhow::Result<()> {
    let provisioner = FfmpegProvisioner::new(&args.version);
    info!("Provisioning ffmpeg {} into {}", args.version, args.dest_dir.display());

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bytes}/{total_bytes} [{bar:40}] {bytes_per_sec}")
            .expect("progress template is valid"),
    );

    let tools = provisioner.provision(&args.dest_dir, |downloaded, total| {
        if let Some(total) = total {
            bar.set_length(total);
        }
        bar.set_position(downloaded);
    })?;
    bar.finish_and_clear();

    println!("ffmpeg:  {}", tools.ffmpeg_path.display());
    println!("ffprobe: {}", tools.ffprobe_path.display());
    println!("ffplay:  {}", tools.ffplay_path.display());
    Ok(())
}
