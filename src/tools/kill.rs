use log::debug;

use crate::executor::{Cmd, ExecError, FailureCause};

use super::ToolError;

/// Unique process ids from `lsof -t` output, in the order they appear.
fn parse_pids(output: &str) -> Vec<String> {
    let mut pids: Vec<String> = Vec::new();
    for pid in output.lines().map(str::trim) {
        let numeric = !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit());
        if numeric && !pids.iter().any(|p| p == pid) {
            pids.push(pid.to_string());
        }
    }
    pids
}

/// Process ids from an `lsof -t` run.
///
/// `lsof` exits non-zero when nothing matches, so only that case means no pids;
/// a missing or unspawnable `lsof` is an error.
fn pids_from(result: Result<String, ExecError>) -> Result<Vec<String>, ToolError> {
    match result {
        Ok(out) => Ok(parse_pids(&out)),
        Err(ExecError::Execution(e)) if matches!(e.cause, FailureCause::Exit(_)) => {
            debug!("lsof found nothing: {e}");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Kill whatever is listening on `port`.
///
/// # Errors
///
/// Returns `ToolError::InvalidArgument` for a non-numeric port,
/// `ToolError::PortNotInUse` when `lsof` finds nothing, or the failing `lsof`
/// or `kill`.
pub fn port(port: &str) -> Result<(), ToolError> {
    if port.parse::<u16>().is_err() {
        return Err(ToolError::InvalidArgument {
            name: "port",
            value: port.to_string(),
        });
    }

    let pids = pids_from(Cmd::build("lsof -t -i:%v", &[port]).run())?;
    if pids.is_empty() {
        return Err(ToolError::PortNotInUse(port.to_string()));
    }

    Cmd::from_tokens(std::iter::once("kill".to_string()).chain(pids)).run()?;
    Ok(())
}
