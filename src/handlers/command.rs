//! Handlers that run external programs.

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::stack::Frame;
use crate::core::step::StepsBuilder;
use crate::helpers::process::{self, ProcessOutput};
use crate::installer::Installer;
use crate::platform::OsFamily;

fn output_frame(output: ProcessOutput) -> Frame {
    Frame::new(output.code.to_string()).with_output(output.stdout, output.stderr)
}

/// COMMAND: run the parameter as a script and capture its output.
///
/// Bash on everything but Windows, where it becomes a batch file. The exit
/// code is the result; a non-zero code is not an error.
pub fn run(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let output = if installer.facts().os_family() == OsFamily::Win {
        process::run_batch_script(parameter)
    } else {
        process::run_bash_script(parameter)
    }
    .context("error executing the command")?;

    debug!(code = output.code, "command finished");
    Ok(output_frame(output))
}

/// ASYNC: start the script and return at once.
pub fn run_async(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let windows = installer.facts().os_family() == OsFamily::Win;
    process::start_script(parameter, windows).context("can't run command async")?;
    Ok(Frame::new(""))
}

/// PKG: install a macOS package onto the system volume.
pub fn pkg(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    let output = process::run_process(
        &["sudo", "installer", "-pkg", parameter, "-target", "/"],
        None,
    )
    .context("can't run the package installer")?;
    Ok(output_frame(output))
}

/// INSTALL_CERT: trust a root certificate file, via an inserted COMMAND.
pub fn install_cert(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let command = match installer.facts().os_family() {
        OsFamily::Win => format!("certutil -addstore -f \"ROOT\" {}", parameter),
        OsFamily::Mac => format!(
            "sudo security add-trusted-cert -d -r trustRoot -k /Library/Keychains/System.keychain {}",
            parameter
        ),
        other => bail!("installing certificates not yet supported on {}", other),
    };
    installer.insert(StepsBuilder::new().cmd(command).build())?;
    Ok(Frame::new("N/A"))
}
