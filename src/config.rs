use clap::Parser;
use std::path::PathBuf;

/// Command line options for the viewer.
#[derive(Parser, Debug, Clone)]
#[command(name = "firefly_grove", about = "Night-time grove viewer")]
pub struct ViewerConfig {
    /// Directory holding `objects/...`.
    #[arg(long, default_value = "resources")]
    pub assets: PathBuf,

    #[arg(long, default_value_t = 800)]
    pub width: u32,

    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Requested MSAA sample count for the offscreen pass.
    #[arg(long, default_value_t = 4)]
    pub samples: u32,

    /// Render a single frame to this PNG and exit instead of opening a window.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Scene time in seconds used for `--screenshot`.
    #[arg(long, default_value_t = 0.0)]
    pub time: f32,

    /// Start with the camera spotlight switched on.
    #[arg(long)]
    pub spotlight: bool,

    /// Start with tone mapping switched on.
    #[arg(long)]
    pub effect: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("resources"),
            width: 800,
            height: 600,
            samples: 4,
            screenshot: None,
            time: 0.0,
            spotlight: false,
            effect: false,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.width > 0 && self.height > 0,
            "window size must be non-zero, got {}x{}",
            self.width,
            self.height
        );
        anyhow::ensure!(self.samples > 0, "sample count must be at least 1");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parser() {
        let parsed = ViewerConfig::parse_from(["firefly_grove"]);
        let default = ViewerConfig::default();
        assert_eq!(parsed.assets, default.assets);
        assert_eq!((parsed.width, parsed.height), (800, 600));
        assert_eq!(parsed.samples, 4);
        assert!(parsed.screenshot.is_none());
        assert!(!parsed.spotlight && !parsed.effect);
    }

    #[test]
    fn parses_screenshot_options() {
        let parsed = ViewerConfig::parse_from([
            "firefly_grove",
            "--assets",
            "/tmp/grove",
            "--screenshot",
            "out.png",
            "--time",
            "2.5",
            "--spotlight",
        ]);
        assert_eq!(parsed.assets, PathBuf::from("/tmp/grove"));
        assert_eq!(parsed.screenshot, Some(PathBuf::from("out.png")));
        assert_eq!(parsed.time, 2.5);
        assert!(parsed.spotlight);
    }

    #[test]
    fn rejects_zero_size() {
        let config = ViewerConfig {
            width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ViewerConfig::default().validate().is_ok());
    }
}
