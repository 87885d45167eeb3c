use gms_demo::config::{DemoConfig, CONFIG_FILE};
use gms_demo::driver::run;
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Warn);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(|buf, record| {
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn main() -> ExitCode {
    init_logger();

    let config = match DemoConfig::load_or_default(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = gms_core::init_thread_pool(config.n_threads) {
        warn!("using the default thread pool: {}", err);
    }

    #[cfg(feature = "window")]
    let mut surface = gms_demo::window::WindowSurface::new();
    #[cfg(not(feature = "window"))]
    let mut surface = gms_demo::display::RecordingSurface::new();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match run(&config, &mut surface, &mut out) {
        Ok(report) => {
            info!(
                "keypoints {:?}, {} candidates, GMS sizes {:?}",
                report.keypoints, report.candidates, report.gms_sizes
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
