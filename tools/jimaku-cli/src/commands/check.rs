//! Check encoder availability and configuration.

use std::path::Path;

use jimaku_common::config::{config_file_path, AppConfig};
use jimaku_render_engine::{Encoder, FfmpegEncoder};

pub async fn run(config: &AppConfig, explicit_config: Option<&Path>) -> anyhow::Result<()> {
    println!("Jimaku System Check");
    println!("{}", "=".repeat(50));

    let config_path = explicit_config
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[--] Config: {} (using defaults)", config_path.display());
    }

    let encoder = FfmpegEncoder::new(&config.encoder);
    let available = encoder.is_available().await;
    if available {
        println!(
            "[OK] Encoder: {} / {}",
            config.encoder.ffmpeg_path.display(),
            config.encoder.ffprobe_path.display()
        );
    } else {
        println!(
            "[MISSING] Encoder: {} / {} could not be run",
            config.encoder.ffmpeg_path.display(),
            config.encoder.ffprobe_path.display()
        );
    }
    println!(
        "     video: {} preset={} crf={}  audio: {} {}k",
        config.encoder.video_codec,
        config.encoder.preset,
        config.encoder.crf,
        config.encoder.audio_codec,
        config.encoder.audio_bitrate_kbps
    );

    let temp_dir = config.resolved_temp_dir();
    let temp_ok = std::fs::create_dir_all(&temp_dir).is_ok()
        && std::fs::metadata(&temp_dir)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false);
    if temp_ok {
        println!("[OK] Temp directory: {}", temp_dir.display());
    } else {
        println!("[WARN] Temp directory not writable: {}", temp_dir.display());
    }

    println!();
    if available {
        println!("Jimaku is ready.");
        Ok(())
    } else {
        anyhow::bail!("ffmpeg/ffprobe not found; install them or set encoder.ffmpeg_path")
    }
}
