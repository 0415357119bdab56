// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Program output name, `<env>_fw_<version>`.

use crate::BuildEnv;

pub fn program_name(env_name: &str, version: &str) -> String {
    format!("{env_name}_fw_{version}")
}

/// Rename the program after the active environment and the firmware version.
///
/// The version option is required; without it the build cannot name its
/// output and the error is returned to the caller.
pub fn apply(env: &mut dyn BuildEnv) -> Result<String, Error> {
    let version = env
        .project_option(consts::OPTION_FW_VERSION)
        .ok_or(Error::MissingOption(consts::OPTION_FW_VERSION))?;
    let name = program_name(env.env_name(), version);
    tracing::debug!("program name set to {name}");
    env.set_prog_name(name.clone());
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    MissingOption(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MissingOption(name) => {
                write!(f, r#"missing required project option "{name}""#)
            }
        }
    }
}

impl std::error::Error for Error {}
