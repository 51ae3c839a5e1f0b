use std::path::{Path, PathBuf};

use anyhow::Result;
use ap_core::config::{PlayerConfig, load_config};
use clap::{ArgAction, Parser};

/// Fichier de configuration lu s'il existe.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// asciiplay : lecteur vidéo ASCII avec audio synchronisé.
///
/// `-h` est pris par `--height` : `--help` et `--version` sont longs uniquement.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Largeur de la grille en caractères (défaut 130).
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub width: Option<u16>,

    /// Hauteur de la grille en caractères (défaut 30).
    #[arg(short = 'h', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub height: Option<u16>,

    /// Média à lire (vidéo, avec ou sans piste audio).
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version.
    #[arg(long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Arguments positionnels ignorés.
    #[arg(hide = true)]
    pub ignored: Vec<String>,
}

const KNOWN_LONG: &[&str] = &["--width", "--height", "--file", "--help", "--version"];
const KNOWN_SHORT: &[char] = &['w', 'h', 'f'];

/// Retire les options inconnues de la ligne de commande.
///
/// Unknown `--long[=value]` and `-x` options are dropped. A value that
/// followed an unknown option stays behind as a positional and is ignored.
///
/// # Example
/// ```
/// use ap_app::cli::sanitize_args;
/// let args = ["asciiplay", "--speed=2", "-f", "a.mp4", "-q"].map(String::from);
/// assert_eq!(sanitize_args(args), vec!["asciiplay", "-f", "a.mp4"]);
/// ```
pub fn sanitize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let mut kept: Vec<String> = iter.next().into_iter().collect();
    for arg in iter {
        let keep = if arg == "--" || !arg.starts_with('-') || arg == "-" {
            true
        } else if arg.starts_with("--") {
            let name = arg.split('=').next().unwrap_or_default();
            KNOWN_LONG.contains(&name)
        } else {
            arg.chars().nth(1).is_some_and(|c| KNOWN_SHORT.contains(&c))
        };
        if keep {
            kept.push(arg);
        } else {
            log::debug!("Option inconnue ignorée : {arg}");
        }
    }
    kept
}

impl Cli {
    /// Parse process arguments, ignoring unknown options.
    #[must_use]
    pub fn parse_lenient() -> Self {
        Self::parse_from(sanitize_args(std::env::args()))
    }

    /// Configuration effective : défauts < fichier < CLI.
    ///
    /// # Errors
    /// Returns an error if the config file exists but is invalid, or if the
    /// merged configuration does not validate.
    pub fn resolve_config(&self, config_path: &Path) -> Result<PlayerConfig> {
        let mut config = if config_path.exists() {
            load_config(config_path)?
        } else {
            PlayerConfig::default()
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(sanitize_args(args.iter().map(|s| (*s).to_string())))
    }

    #[test]
    fn short_flags() {
        let cli = parse(&["asciiplay", "-w", "80", "-h", "24", "-f", "clip.mp4"]).unwrap();
        assert_eq!(cli.width, Some(80));
        assert_eq!(cli.height, Some(24));
        assert_eq!(cli.file, PathBuf::from("clip.mp4"));
    }

    #[test]
    fn long_flags_with_equals() {
        let cli = parse(&["asciiplay", "--width=100", "--height", "40", "--file=x.mkv"]).unwrap();
        assert_eq!(cli.width, Some(100));
        assert_eq!(cli.height, Some(40));
        assert_eq!(cli.file, PathBuf::from("x.mkv"));
    }

    #[test]
    fn unknown_options_are_ignored() {
        let cli = parse(&["asciiplay", "--loop", "--speed", "2", "-x", "-f", "a.mp4"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("a.mp4"));
        assert_eq!(cli.ignored, vec!["2".to_string()]);
        assert_eq!(cli.width, None);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(parse(&["asciiplay", "-w", "0", "-f", "a.mp4"]).is_err());
    }

    #[test]
    fn file_is_required() {
        assert!(parse(&["asciiplay", "-w", "10"]).is_err());
    }

    #[test]
    fn cli_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[render]\nwidth = 90\nheight = 20\n").unwrap();
        let cli = parse(&["asciiplay", "-h", "12", "-f", "a.mp4"]).unwrap();
        let config = cli.resolve_config(file.path()).unwrap();
        assert_eq!((config.width, config.height), (90, 12));
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let cli = parse(&["asciiplay", "-f", "a.mp4"]).unwrap();
        let config = cli
            .resolve_config(Path::new("/definitely/not/here.toml"))
            .unwrap();
        assert_eq!((config.width, config.height), (130, 30));
    }
}
