use std::{path::PathBuf, time::Instant};

use coronagraph::{
    FrameExporter, GerchbergSaxton, Image, OcclusionGeometry, OcclusionShape, OpticalSystem,
    Palette, ABERRATION_SEED,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "coronagraph",
    about = "Coronagraph simulation and Gerchberg-Saxton phase retrieval"
)]
struct Opt {
    /// Path to the input image
    #[structopt(parse(from_os_str))]
    image: PathBuf,
    /// Occulter shape: circle or square
    #[structopt(long, default_value = "circle")]
    shape: OcclusionShape,
    /// Occulter width [pixel]
    #[structopt(short, long, default_value = "300")]
    width: usize,
    /// Number of Gerchberg-Saxton iterations
    #[structopt(short, long, default_value = "10")]
    iterations: usize,
    /// Phase aberration generator seed
    #[structopt(long, default_value = "12345")]
    seed: u64,
    /// Do not track the residual inside the occulter
    #[structopt(long)]
    no_error: bool,
    /// Frames output directory
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    output: PathBuf,
    /// Frames file name prefix
    #[structopt(long, default_value = "coronagraph")]
    prefix: String,
    /// Frames color map: gray or cubehelix
    #[structopt(long, default_value = "gray")]
    palette: Palette,
    /// Frames magnification factor
    #[structopt(long, default_value = "1")]
    scale: u32,
    /// Save the residuals to a CSV file
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
    /// Plot the residuals to a SVG file
    #[structopt(long, parse(from_os_str))]
    plot: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    let now = Instant::now();

    let image = Image::load(&opt.image)?;
    if opt.seed != ABERRATION_SEED {
        log::info!("using aberration seed {}", opt.seed);
    }
    let observation = OpticalSystem::new(OcclusionGeometry::new(opt.shape, opt.width))
        .seed(opt.seed)
        .simulate(&image)?;

    let mask = (!opt.no_error).then_some(&observation.mask);
    let trace = GerchbergSaxton::new(opt.iterations)?.run(
        &observation.image,
        &observation.aberration,
        mask,
    )?;

    let paths = FrameExporter::new(&opt.output)
        .prefix(&opt.prefix)
        .palette(opt.palette)
        .scale(opt.scale)
        .save(&trace)?;

    if let Some(errors) = trace.errors() {
        println!("Sum square error in the occulted region:");
        errors
            .iter()
            .enumerate()
            .for_each(|(k, e)| println!(" - iteration {:>3}: {:.6e}", k, e));
    }
    if let Some(path) = opt.csv {
        trace.to_csv(path)?;
    }
    if let Some(path) = opt.plot {
        trace.plot_errors(path)?;
    }

    println!(
        "Saved {} frames to {:?} in {:.2}s",
        paths.len(),
        opt.output,
        now.elapsed().as_secs_f64()
    );
    Ok(())
}
