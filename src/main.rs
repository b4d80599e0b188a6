use bulb::render::{frame_angle, frame_path, RenderConfig, Renderer};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Renders a rotating power-8 Mandelbulb", long_about = None)]
struct Args {
    /// JSON file with render parameters; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Supersampling grid side per pixel.
    #[arg(short, long)]
    samples: Option<u32>,

    #[arg(short, long, default_value_t = 30)]
    frames: usize,

    /// Directory receiving frame_000.png, frame_001.png, ...
    #[arg(short, long, default_value = "animation")]
    out: PathBuf,

    /// Worker threads; rayon picks one per core when unset.
    #[arg(short, long)]
    threads: Option<usize>,

    /// 0 error, 1 warn, 2 info, 3 debug, 4 trace.
    #[arg(long, default_value_t = 2)]
    log_level: u8,

    /// Same as --log-level 4.
    #[arg(short, long)]
    verbose: bool,
}

fn log_filter_from_level(level: u8) -> log::LevelFilter {
    match level {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn load_config(args: &Args) -> bulb::Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            RenderConfig::from_json_file(path)?
        }
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    Ok(config)
}

fn main() -> bulb::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { 4 } else { args.log_level };
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{:5} {}", record.level(), record.args()))
        .filter_level(log_filter_from_level(level))
        .init();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let renderer = Renderer::new(load_config(&args)?)?;
    let (width, height) = (renderer.config().width, renderer.config().height);
    fs::create_dir_all(&args.out)?;

    log::info!(
        "Rendering {} frames at {}x{} into {}",
        args.frames,
        width,
        height,
        args.out.display()
    );
    let start = Instant::now();
    for i in 0..args.frames {
        let frame_start = Instant::now();
        let img = renderer.render_frame(frame_angle(i, args.frames), width, height)?;
        img.save(frame_path(&args.out, i))?;
        log::info!(
            "Rendered frame {}/{} in {:.2} s",
            i + 1,
            args.frames,
            frame_start.elapsed().as_secs_f32()
        );
    }
    log::info!("Render took {} s", start.elapsed().as_secs_f32());
    Ok(())
}
