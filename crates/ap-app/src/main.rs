use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::Result;
use ap_app::cli::{Cli, DEFAULT_CONFIG_PATH};
use ap_app::session;
use ap_audio::staging::{StagingOptions, play_file};
use ap_core::shutdown::ShutdownFlag;
use ap_render::presenter::Presenter;
use ap_source::video::FfmpegVideo;

fn main() -> Result<()> {
    // 1. Parser CLI (options inconnues ignorées)
    let cli = Cli::parse_lenient();

    // 2. Charger la config, appliquer les overrides CLI
    let config = cli.resolve_config(Path::new(DEFAULT_CONFIG_PATH))?;

    // 3. Initialiser le logging (RUST_LOG prioritaire)
    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .parse_default_env()
        .init();

    // 4. Signal → arrêt coopératif
    let shutdown = ShutdownFlag::new();
    if let Err(e) = session::install_signal_handler(&shutdown) {
        log::warn!("{e:#}");
    }

    // 5. Ouvrir la vidéo
    let palette = config.palette()?;
    let mut video = FfmpegVideo::open(&cli.file, config.width, config.height)?;
    let info = video.info();
    log::info!(
        "Using video: {} ({}×{} @ {:.3} fps)",
        cli.file.display(),
        info.width,
        info.height,
        info.fps
    );

    // 6. Audio sur son propre thread, même fichier
    let options = StagingOptions::from_config(&config);
    let audio_path = cli.file.clone();
    let audio = move |flag: &ShutdownFlag| play_file(&audio_path, &options, flag);

    // 7. Rendu jusqu'à la fin du flux ou un signal
    let grid_bytes = (usize::from(config.width) + 1) * usize::from(config.height);
    let mut presenter = Presenter::new(BufWriter::with_capacity(grid_bytes + 64, io::stdout()));
    let report = session::run_session(
        &mut video,
        &mut presenter,
        &palette,
        (config.width, config.height),
        Some(audio),
        &shutdown,
    )?;

    log::info!(
        "{} frames, {:.2} fps mesurés, {} recalages",
        report.playback.frames,
        report.playback.average_fps,
        report.playback.resets
    );
    if let Some(audio) = report.audio {
        log::info!(
            "Audio : {:?}, {} échantillons, {} underruns",
            audio.outcome,
            audio.samples_staged,
            audio.underruns
        );
    }
    Ok(())
}
