use std::path::PathBuf;

use coronagraph_animate::{Animation, FPS};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "coronagraph-animate",
    about = "Animate the coronagraph Gerchberg-Saxton frames"
)]
struct Opt {
    /// Last frame number
    last: usize,
    /// Frames directory
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    frames: PathBuf,
    /// Frames file name prefix
    #[structopt(long, default_value = "coronagraph")]
    prefix: String,
    /// Animation file
    #[structopt(short, long, parse(from_os_str), default_value = "coronagraph.gif")]
    output: PathBuf,
    /// Frame rate [frame/s]
    #[structopt(long)]
    fps: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let n_frame = Animation::new(&opt.frames)
        .prefix(&opt.prefix)
        .fps(opt.fps.unwrap_or(FPS))
        .assemble(opt.last, &opt.output)?;
    if n_frame == 0 {
        println!("No frame found in {:?}", opt.frames);
    } else {
        println!("{} frames written to {:?}", n_frame, opt.output);
    }
    Ok(())
}
