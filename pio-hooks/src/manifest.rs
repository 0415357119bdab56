// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! ESP Web Tools manifest listing the images to flash and their offsets.
//!
//! Generated after the program is linked. Everything here is best effort: a
//! missing image only drops its part and a failed write is reported, the
//! firmware build itself is never affected.

use {
    crate::{atomic, chip::ChipFamily, BuildEnv},
    serde::Serialize,
    std::path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    /// File name relative to the manifest.
    pub path: String,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Build {
    #[serde(rename = "chipFamily")]
    pub chip_family: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub new_install_prompt_erase: bool,
    pub improv: bool,
    pub builds: Vec<Build>,
}

/// Values the manifest is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub name: String,
    pub version: String,
    pub mcu: String,
    pub prog_name: String,
    pub build_dir: PathBuf,
}

/// Option values in `platformio.ini` are often written as `'1.2'`.
pub fn strip_quotes(value: &str) -> String {
    value.replace('\'', "")
}

impl Inputs {
    pub fn from_env(env: &dyn BuildEnv) -> Self {
        let prog_name = env.prog_name().to_owned();
        Self {
            name: strip_quotes(&env.project_option_or(consts::OPTION_FW_NAME, &prog_name)),
            version: strip_quotes(
                &env.project_option_or(consts::OPTION_FW_VERSION, consts::DEFAULT_FW_VERSION),
            ),
            mcu: env
                .board_config(consts::BOARD_MCU_KEY)
                .unwrap_or(consts::DEFAULT_MCU)
                .to_owned(),
            build_dir: env.build_dir().to_owned(),
            prog_name,
        }
    }

    pub fn chip_family(&self) -> ChipFamily {
        ChipFamily::from_mcu(&self.mcu)
    }

    /// File name of the application image.
    pub fn app_bin(&self) -> String {
        format!("{}.bin", self.prog_name)
    }
}

/// Parts for the images present in `build_dir`, in flash order. The
/// application is always listed, whether or not it exists yet.
pub fn parts(family: ChipFamily, build_dir: &Path, app_bin: &str) -> Vec<Part> {
    let optional = [
        (consts::BOOTLOADER_BIN, family.bootloader_addr()),
        (consts::PARTITIONS_BIN, consts::PARTITIONS_ADDR),
        (consts::BOOT_APP0_BIN, consts::BOOT_APP0_ADDR),
    ];
    optional
        .into_iter()
        .filter(|(file, _)| build_dir.join(file).exists())
        .chain(core::iter::once((app_bin, consts::APP_ADDR)))
        .map(|(file, offset)| Part {
            path: file.to_owned(),
            offset,
        })
        .collect()
}

impl Manifest {
    pub fn new(inputs: &Inputs) -> Self {
        let family = inputs.chip_family();
        Self {
            name: inputs.name.clone(),
            version: inputs.version.clone(),
            new_install_prompt_erase: true,
            improv: true,
            builds: vec![Build {
                chip_family: family.label().to_owned(),
                parts: parts(family, &inputs.build_dir, &inputs.app_bin()),
            }],
        }
    }

    /// Pretty printed with two space indentation. Non-ASCII names are written
    /// as UTF-8, not escaped.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest into `dir`, replacing any previous one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(consts::MANIFEST_JSON);
        let json = self.to_json().map_err(Error::Serialize)?;
        atomic::write(&path, json.as_bytes()).map_err(Error::Write)?;
        Ok(path)
    }
}

/// How `boot_app0.bin` ended up in the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provision {
    AlreadyPresent,
    Copied(PathBuf),
}

/// Copy the framework's `boot_app0.bin` into `build_dir` if the build did not
/// produce one.
pub fn provision_boot_app0(env: &dyn BuildEnv, build_dir: &Path) -> Result<Provision, FallbackError> {
    let target = build_dir.join(consts::BOOT_APP0_BIN);
    if target.exists() {
        return Ok(Provision::AlreadyPresent);
    }
    let package = env
        .package_dir(consts::ARDUINO_FRAMEWORK_PACKAGE)
        .ok_or(FallbackError::NoPackage(consts::ARDUINO_FRAMEWORK_PACKAGE))?;
    let source: PathBuf = consts::BOOT_APP0_PACKAGE_PATH
        .iter()
        .fold(package.to_path_buf(), |path, part| path.join(part));
    if !source.exists() {
        return Err(FallbackError::MissingSource(source));
    }
    std::fs::copy(&source, &target).map_err(FallbackError::Copy)?;
    Ok(Provision::Copied(source))
}

/// Provision `boot_app0.bin`, then build and write the manifest.
pub fn generate(env: &dyn BuildEnv) -> Result<(Manifest, PathBuf), Error> {
    let inputs = Inputs::from_env(env);
    match provision_boot_app0(env, &inputs.build_dir) {
        Ok(Provision::AlreadyPresent) => {}
        Ok(Provision::Copied(source)) => {
            tracing::debug!("copied {} from {}", consts::BOOT_APP0_BIN, source.display())
        }
        Err(e) => tracing::debug!("{} not provisioned: {e}", consts::BOOT_APP0_BIN),
    }
    let manifest = Manifest::new(&inputs);
    let path = manifest.write(&inputs.build_dir)?;
    Ok((manifest, path))
}

/// Post build action: [`generate`] with the outcome logged.
pub fn post_build(env: &dyn BuildEnv) {
    match generate(env) {
        Ok((manifest, path)) => tracing::info!(
            "manifest for '{}' generated: {}",
            manifest.name,
            path.display()
        ),
        Err(e) => tracing::error!("manifest not generated: {e}"),
    }
}

#[derive(Debug)]
pub enum Error {
    Serialize(serde_json::Error),
    Write(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Serialize(e) => write!(f, "failed to serialize manifest: {e}"),
            Error::Write(e) => write!(f, "failed to write manifest: {e}"),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Debug)]
pub enum FallbackError {
    NoPackage(&'static str),
    MissingSource(PathBuf),
    Copy(std::io::Error),
}

impl std::fmt::Display for FallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FallbackError::NoPackage(name) => write!(f, "package {name} is not installed"),
            FallbackError::MissingSource(path) => {
                write!(f, "{} does not exist", path.display())
            }
            FallbackError::Copy(e) => write!(f, "copy failed: {e}"),
        }
    }
}

impl std::error::Error for FallbackError {}
