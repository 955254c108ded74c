use envlink_config::Config;
use envlink_env::Engine;
use std::process::Command;

/// Resolve into the process environment, then hand it to `command`.
///
/// Entries that failed keep their declared values; the command still runs.
pub async fn execute(config: &Config, command: Vec<String>) -> eyre::Result<()> {
    let Some((program, args)) = command.split_first() else {
        eyre::bail!("no command given");
    };

    let engine = Engine::from_config(config)?;
    engine.run().await?;

    tracing::debug!(program = %program, "Running command");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| eyre::eyre!("failed to run '{program}': {e}"))?;

    std::process::exit(exit_code(status));
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
