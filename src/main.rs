use clap::Parser;

use ferrous_bar::pipelines;
use ferrous_bar::trim_opt::{AdapterSource, TrimCliOptions, TrimOpt};

#[derive(Parser)]
#[command(name = "ferrous-bar")]
#[command(about = "FerrousBar - adapter and barcode trimming for sequencing reads", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    opts: TrimCliOptions,
}

fn main() {
    let cli = Cli::parse();

    // Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace)
    // to Rust log levels
    let log_level = match cli.opts.verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();

    let mut opt = match TrimOpt::from_cli(&cli.opts) {
        Ok(opt) => opt,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(errors) = opt.validate() {
        for e in &errors {
            log::error!("{}", e);
        }
        std::process::exit(1);
    }

    // Reasonable upper bound to prevent accidental resource exhaustion
    let max_threads = num_cpus::get() * 2;
    if opt.n_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            opt.n_threads,
            max_threads,
            max_threads
        );
        opt.n_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(opt.n_threads)
        .build_global()
    {
        Ok(_) => {
            log::debug!("Built global Rayon thread pool with {} threads", opt.n_threads);
        }
        Err(e) => {
            log::warn!("Failed to configure thread pool: {} (may already be initialized)", e);
        }
    }

    let thread_word = if opt.n_threads == 1 { "thread" } else { "threads" };
    log::info!("Using {} {}", opt.n_threads, thread_word);

    if opt.verbosity >= 3 {
        log::info!("Reads: {}", opt.reads.display());
        if let Some(r2) = &opt.reads2 {
            log::info!("Reads 2: {}", r2.display());
        }
        log::info!("Target: {}", opt.target.display());
        match &opt.adapters {
            AdapterSource::None => {}
            AdapterSource::File(p) => log::info!("Adapters: {}", p.display()),
            AdapterSource::Preset(p) => log::info!("Adapter preset: {:?}", p),
            AdapterSource::Sequence(s) => log::info!("Adapter: {}", String::from_utf8_lossy(s)),
        }
        if opt.has_adapters() {
            log::info!(
                "  trim end {}, match {}, mismatch {}, gap {}, error rate {}, min overlap {}",
                opt.adapter.trim_end,
                opt.adapter.match_score,
                opt.adapter.mismatch_score,
                opt.adapter.gap_score,
                opt.adapter.error_rate,
                opt.adapter.min_overlap.unwrap_or(0)
            );
        }
        if let Some(b) = &opt.barcodes {
            log::info!("Barcodes: {}", b.display());
            log::info!(
                "  trim end {}, match {}, mismatch {}, gap {}, error rate {}",
                opt.barcode.trim_end,
                opt.barcode.match_score,
                opt.barcode.mismatch_score,
                opt.barcode.gap_score,
                opt.barcode.error_rate
            );
        }
        log::info!("Min read length: {}", opt.min_read_length);
    }

    match pipelines::run(&opt) {
        Ok(summary) => {
            for line in summary.to_string().lines() {
                log::info!("{}", line);
            }
        }
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
