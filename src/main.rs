use clap::Parser;
use firefly_grove::ViewerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ViewerConfig::parse();
    config.validate()?;
    if config.screenshot.is_some() {
        firefly_grove::screenshot(&config)
    } else {
        firefly_grove::run(config)
    }
}
