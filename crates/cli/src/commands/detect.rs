use envlink_config::Config;
use envlink_env::{RuntimeDetector, SignalDetector};

pub fn execute(config: &Config) -> eyre::Result<()> {
    let profile = SignalDetector::new(config.signals.clone()).detect();
    println!("{profile}");
    Ok(())
}
