//! MOVE_FF: put a file into a fresh Firefox profile.
//!
//! The profile is created by running Firefox itself, then pointed to by a
//! rewritten `profiles.ini`. Firefox 67 and later also need an
//! `installs.ini` entry that pins the profile to the installation, keyed by
//! a hash of the install directory.

use anyhow::{Result, bail};

use crate::core::stack::Frame;
use crate::core::step::{Operation, StepsBuilder};
use crate::installer::Installer;
use crate::platform::{Arch, OsFamily};
use crate::software::VersionParser;

const PROFILE_DIR: &str = "Profiles{{DELIMITER}}testbirds.default{{DELIMITER}}";

/// First major version that locks profiles to installations.
const INSTALLS_INI_SINCE: u32 = 67;

const XULSTORE: &str = r#"{"chrome://browser/content/browser.xul":{"main-window":{"screenX":"4","screenY":"4","width":"1296","height":"812","sizemode":"maximized"}}}"#;

struct Layout {
    firefox: &'static str,
    profiles: &'static str,
    newline: &'static str,
}

fn layout(family: OsFamily) -> Option<Layout> {
    match family {
        OsFamily::Win => Some(Layout {
            firefox: "{{PROGRAM_FILES_X86}}Mozilla Firefox\\firefox.exe",
            profiles: "C:\\Users\\testbirds\\AppData\\Roaming\\Mozilla\\Firefox\\",
            newline: "\r\n",
        }),
        OsFamily::Mac => Some(Layout {
            firefox: "/Applications/Firefox.app/Contents/MacOS/firefox",
            profiles: "/Users/testbirds/Library/Application Support/Firefox/",
            newline: "\n",
        }),
        _ => None,
    }
}

/// Install hash Firefox uses for the default install location.
fn installation_hash(family: OsFamily, arch: Arch) -> Option<&'static str> {
    match (family, arch) {
        (OsFamily::Win, Arch::X86) => Some("E7CF176E110C211B"),
        (OsFamily::Win, _) => Some("308046B0AF4A39CB"),
        (OsFamily::Mac, _) => Some("2656FF1E876E9973"),
        _ => None,
    }
}

/// The `installs.ini` section name, if this Firefox version needs one.
fn installation(family: OsFamily, version: Option<&str>, arch: Option<Arch>) -> Option<&'static str> {
    let (version, arch) = (version?, arch?);
    if VersionParser::new(Some(version)).major() < INSTALLS_INI_SINCE {
        return None;
    }
    installation_hash(family, arch)
}

/// Steps that create the profile and move the payload on top of the stack
/// into it as `file_name`. Balanced: the stack is unchanged afterwards.
fn profile_steps(
    layout: &Layout,
    file_name: &str,
    installation: Option<&str>,
    maximize: bool,
) -> Vec<crate::core::step::Step> {
    let nl = layout.newline;
    let profiles = layout.profiles;

    let profiles_ini = [
        "[General]",
        "StartWithLastProfile=1",
        "",
        "[Profile0]",
        "Name=default",
        "IsRelative=1",
        "Path=Profiles/testbirds.default",
        "Default=1",
        "",
    ]
    .join(nl);

    let mut steps = StepsBuilder::new()
        .cmd(format!(
            "\"{}\" -CreateProfile \"testbirds {}Profiles{{{{DELIMITER}}}}testbirds.default\"",
            layout.firefox, profiles
        ))
        .pop()
        .to_file(profiles_ini)
        .move_to(format!("{}profiles.ini", profiles))
        .pop()
        .pop()
        .move_to(format!("{}{}{}", profiles, PROFILE_DIR, file_name))
        .pop();

    if let Some(installation) = installation {
        let installs_ini = format!(
            "[{}]{nl}Default=Profiles/testbirds.default{nl}Locked=1{nl}",
            installation
        );
        steps = steps
            .to_file(installs_ini)
            .move_to(format!("{}installs.ini", profiles))
            .pop()
            .pop();
    }

    if maximize {
        steps = steps
            .add(Operation::ToFile, XULSTORE)
            .move_to(format!("{}{}xulstore.json", profiles, PROFILE_DIR))
            .pop()
            .pop();
    }

    steps.build()
}

pub fn move_ff(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let family = installer.facts().os_family();
    let Some(layout) = layout(family) else {
        bail!("putting files into the firefox profile not implemented on {}", family);
    };

    let software = installer.software();
    let installation = installation(family, software.version.as_deref(), software.arch);

    let steps = profile_steps(&layout, parameter, installation, family == OsFamily::Win);
    installer.insert(steps)?;
    Ok(Frame::new(layout.profiles))
}
