// Décodage vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`     : interroge ffprobe pour width/height/fps
//   - `spawn_gray_pipe` : lance ffmpeg → flux raw gray 8 bits sur stdout,
//                         déjà redimensionné à la grille, au débit sondé
//   - `FfmpegVideo`     : `VideoSource` lisant une frame par appel

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};
use ap_core::frame::LuminanceGrid;
use ap_core::traits::VideoSource;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Parse un débit ffprobe : "24/1", "30000/1001", ou "25".
///
/// Returns `None` for "0/0" and other non-positive rates.
///
/// # Example
/// ```
/// use ap_source::video::parse_frame_rate;
/// assert_eq!(parse_frame_rate("24/1"), Some(24.0));
/// assert_eq!(parse_frame_rate("0/0"), None);
/// ```
#[must_use]
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let mut parts = value.trim().splitn(2, '/');
    let num: f64 = parts.next()?.trim().parse().ok()?;
    let den: f64 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1.0,
    };
    let fps = num / den;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// `avg_frame_rate` is preferred over `r_frame_rate` when both are valid.
/// Returns `None` when no video stream was reported.
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut avg_fps: Option<f64> = None;
    let mut r_fps: Option<f64> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("avg_frame_rate=") {
            avg_fps = parse_frame_rate(val);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            r_fps = parse_frame_rate(val);
        }
    }

    let width = width.filter(|&w| w > 0)?;
    let height = height.filter(|&h| h > 0)?;
    let fps = avg_fps.or(r_fps)?;
    Some(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).with_context(|| {
        format!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        )
    })?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Arguments ffmpeg du pipe gray : redimensionnement à `w × h` et sortie
/// à débit constant `fps`, le même débit que celui du pacer.
///
/// # Example
/// ```
/// use ap_source::video::gray_pipe_args;
/// let args = gray_pipe_args("clip.mp4", 80, 24, 30.0);
/// let r = args.iter().position(|a| a == "-r").unwrap();
/// assert_eq!(args[r + 1], "30");
/// ```
#[must_use]
pub fn gray_pipe_args(path: &str, w: u16, h: u16, fps: f64) -> Vec<String> {
    [
        "-nostdin",
        "-i",
        path,
        "-vf",
        &format!("scale={w}:{h}:flags=bilinear"),
        "-f",
        "rawvideo",
        "-pix_fmt",
        "gray",
        "-r",
        &fps.to_string(),
        "-an", // audio géré par ap-audio
        "-sn",
        "-hide_banner",
        "-loglevel",
        "error",
        "pipe:1",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Lance un processus `ffmpeg` qui écrit des frames gray 8 bits sur stdout.
///
/// Chaque frame = `w × h` bytes, row-major, sans padding. La conversion
/// couleur → luminance et le redimensionnement sont faits par ffmpeg.
/// Le débit de sortie est fixé à `fps` (sources à débit variable incluses).
///
/// # Errors
/// Returns an error if ffmpeg cannot be spawned.
pub fn spawn_gray_pipe(path: &Path, w: u16, h: u16, fps: f64) -> Result<Child> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let child = Command::new("ffmpeg")
        .args(gray_pipe_args(path_str, w, h, fps))
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez qu'il est installé et dans le PATH.")?;

    log::debug!(
        "ffmpeg spawné: {w}x{h} gray @ {fps:.3}fps depuis {}",
        path.display()
    );
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF (même
/// partiel : une frame tronquée compte comme fin de flux), `Err` sur
/// erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Source vidéo ffmpeg : une frame de luminance par `next_frame`.
///
/// The subprocess is killed and reaped on drop.
///
/// # Example
/// ```no_run
/// use ap_core::frame::LuminanceGrid;
/// use ap_core::traits::VideoSource;
/// use ap_source::video::FfmpegVideo;
///
/// let mut video = FfmpegVideo::open("clip.mp4".as_ref(), 130, 30).unwrap();
/// let mut frame = LuminanceGrid::new(130, 30);
/// while video.next_frame(&mut frame).unwrap() {}
/// ```
pub struct FfmpegVideo {
    child: Child,
    stdout: ChildStdout,
    info: VideoInfo,
    width: u16,
    height: u16,
}

impl FfmpegVideo {
    /// Sonde `path` et démarre le décodage à la taille `width × height`.
    ///
    /// # Errors
    /// Returns an error if the file does not exist, has no video stream, or
    /// ffmpeg/ffprobe cannot be run.
    pub fn open(path: &Path, width: u16, height: u16) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("Impossible d'ouvrir le fichier : {}", path.display());
        }
        let info = probe_video(path)?;
        let mut child = spawn_gray_pipe(path, width, height, info.fps)?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("ffmpeg: stdout non disponible");
        };
        Ok(Self {
            child,
            stdout,
            info,
            width,
            height,
        })
    }

    /// Native stream metadata.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }
}

impl VideoSource for FfmpegVideo {
    fn frame_rate(&self) -> f64 {
        self.info.fps
    }

    fn next_frame(&mut self, frame: &mut LuminanceGrid) -> Result<bool> {
        anyhow::ensure!(
            frame.dimensions() == (self.width, self.height),
            "Frame {}x{} attendue, {}x{} fournie",
            self.width,
            self.height,
            frame.width,
            frame.height
        );
        read_exact_or_eof(&mut self.stdout, &mut frame.data).context("Lecture du pipe ffmpeg")
    }
}

impl Drop for FfmpegVideo {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        log::debug!("ffmpeg terminé");
    }
}
