//! Stderr logging bootstrap for the binary.

use flexi_logger::{Logger, LoggerHandle};

use crate::CliError;

/// Install the global logger at `spec` (e.g. `info` or `geoharvest_data=debug`).
///
/// The returned handle must stay alive for the duration of the command.
pub(crate) fn init(spec: &str) -> Result<LoggerHandle, CliError> {
    let handle = Logger::try_with_str(spec)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()?;
    Ok(handle)
}
