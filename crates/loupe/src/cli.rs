use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use navigation::Tuning;
use renderer::{GpuPowerPreference, MagnifierConfig, PostProcess, DEFAULT_BLUR_SAMPLES};

#[derive(Parser, Debug)]
#[command(
    name = "loupe",
    author,
    version,
    about = "On-demand screen magnifier: hold the modifier and scroll to zoom"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Post-process style: `blurry` (multi-tap smear) or `noisy` (jittered single tap).
    #[arg(
        long,
        value_name = "STYLE",
        value_parser = parse_style,
        default_value_t = Style::Blurry
    )]
    pub style: Style,

    /// Taps per pixel for the blurry style.
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_BLUR_SAMPLES,
        value_parser = clap::value_parser!(u32).range(2..=64)
    )]
    pub samples: u32,

    /// Modifier held while scrolling to open the magnifier: `super`, `alt`, `ctrl`, or `shift`.
    #[arg(
        long,
        value_name = "KEY",
        value_parser = parse_modifier,
        default_value_t = TriggerModifier::Super
    )]
    pub modifier: TriggerModifier,

    /// GPU adapter preference: `low` or `high`.
    #[arg(
        long,
        value_name = "POWER",
        value_parser = parse_gpu_power,
        default_value = "high"
    )]
    pub gpu_power: GpuPowerPreference,

    /// Open one session at the current pointer position and exit when it closes.
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub fn magnifier_config(&self) -> MagnifierConfig {
        let post_process = match self.style {
            Style::Blurry => PostProcess::Blurry {
                samples: self.samples,
            },
            Style::Noisy => PostProcess::Noisy,
        };
        MagnifierConfig {
            post_process,
            gpu_power: self.gpu_power,
            tuning: Tuning::DEFAULT,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture the screen once and write it as a PNG.
    Snapshot(SnapshotArgs),
}

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Destination file.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Blurry,
    Noisy,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Style::Blurry => "blurry",
            Style::Noisy => "noisy",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerModifier {
    Super,
    Alt,
    Ctrl,
    Shift,
}

impl fmt::Display for TriggerModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerModifier::Super => "super",
            TriggerModifier::Alt => "alt",
            TriggerModifier::Ctrl => "ctrl",
            TriggerModifier::Shift => "shift",
        })
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_style(value: &str) -> Result<Style, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("style must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "blurry" | "blur" => Ok(Style::Blurry),
        "noisy" | "noise" | "dither" => Ok(Style::Noisy),
        other => Err(format!("unknown style '{other}'; expected blurry or noisy")),
    }
}

pub fn parse_modifier(value: &str) -> Result<TriggerModifier, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("modifier must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "super" | "mod4" | "win" | "logo" => Ok(TriggerModifier::Super),
        "alt" | "mod1" => Ok(TriggerModifier::Alt),
        "ctrl" | "control" => Ok(TriggerModifier::Ctrl),
        "shift" => Ok(TriggerModifier::Shift),
        other => Err(format!(
            "unknown modifier '{other}'; expected super, alt, ctrl, or shift"
        )),
    }
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown GPU power preference '{other}'; expected low or high")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("loupe").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_select_blurry_super_high_power() {
        let cli = parse_from(&[]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.style, Style::Blurry);
        assert_eq!(cli.run.modifier, TriggerModifier::Super);
        assert_eq!(cli.run.gpu_power, GpuPowerPreference::High);
        assert!(!cli.run.once);
        assert_eq!(
            cli.run.magnifier_config().post_process,
            PostProcess::Blurry {
                samples: DEFAULT_BLUR_SAMPLES
            }
        );
    }

    #[test]
    fn noisy_style_ignores_sample_count() {
        let cli = parse_from(&["--style", "noisy", "--samples", "16"]).unwrap();
        assert_eq!(cli.run.magnifier_config().post_process, PostProcess::Noisy);
    }

    #[test]
    fn sample_count_is_range_checked() {
        assert!(parse_from(&["--samples", "1"]).is_err());
        assert!(parse_from(&["--samples", "65"]).is_err());
        let cli = parse_from(&["--samples", "32"]).unwrap();
        assert_eq!(cli.run.samples, 32);
    }

    #[test]
    fn modifier_aliases() {
        assert_eq!(parse_modifier("Mod4"), Ok(TriggerModifier::Super));
        assert_eq!(parse_modifier(" alt "), Ok(TriggerModifier::Alt));
        assert_eq!(parse_modifier("control"), Ok(TriggerModifier::Ctrl));
        assert!(parse_modifier("hyper").is_err());
        assert!(parse_modifier("").is_err());
    }

    #[test]
    fn style_rejects_unknown_values() {
        assert_eq!(parse_style("BLURRY"), Ok(Style::Blurry));
        assert!(parse_style("sharp").is_err());
    }

    #[test]
    fn gpu_power_parses_both_spellings() {
        assert_eq!(parse_gpu_power("low-power"), Ok(GpuPowerPreference::Low));
        assert_eq!(parse_gpu_power("HIGH"), Ok(GpuPowerPreference::High));
        assert!(parse_gpu_power("medium").is_err());
    }

    #[test]
    fn snapshot_subcommand_takes_a_path() {
        let cli = parse_from(&["snapshot", "/tmp/screen.png"]).unwrap();
        match cli.command {
            Some(Command::Snapshot(args)) => {
                assert_eq!(args.path, PathBuf::from("/tmp/screen.png"))
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
