//! Handlers that only touch the stack or the OS facts.

use anyhow::{Result, bail};

use crate::core::stack::Frame;
use crate::installer::Installer;

/// SET: push the parameter itself.
pub fn set(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    Ok(Frame::new(parameter))
}

/// EQUALS: assert the parent's result equals the parameter.
pub fn equals(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let actual = installer.additional_parameter()?;
    if actual != parameter {
        bail!("expected {:?} but found {:?}", parameter, actual);
    }
    Ok(Frame::new("1"))
}

/// REBOOT_NOW: reboot the machine through the OS facts provider.
pub fn reboot_now(_parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    installer.facts().reboot()?;
    Ok(Frame::new(""))
}
