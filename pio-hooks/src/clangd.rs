// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Generate a `.clangd` config from the `c_cpp_properties.json` PlatformIO
//! writes for the VS Code C/C++ extension.
//!
//! The extension understands the ESP32 toolchain out of the box, clangd does
//! not: it needs the toolchain's libstdc++ headers spelled out and chokes on a
//! handful of Xtensa specific GCC flags.

use {
    crate::{atomic, jsonc},
    core::fmt,
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

pub const DEFAULT_CPP_STANDARD: &str = "gnu++11";
pub const DEFAULT_C_STANDARD: &str = "gnu99";

/// Substring identifying the Xtensa ESP32 cross compiler.
pub const XTENSA_TOOLCHAIN_MARKER: &str = "toolchain-xtensa";
pub const XTENSA_TARGET_TRIPLE: &str = "xtensa-esp32-elf";
pub const XTENSA_LIBSTDCXX_VERSION: &str = "8.4.0";

/// GCC flags from the ESP32 compile database that clangd rejects.
pub const REMOVE_FLAGS: [&str; 4] = [
    "-fstrict-volatile-bitfields",
    "-fno-tree-switch-conversion",
    "-mlongcalls",
    "-mtext-section-literals",
];

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub properties: PathBuf,
    pub config: PathBuf,
}

impl Paths {
    /// `.vscode/c_cpp_properties.json` and `.clangd` in the project root.
    pub fn for_project(project_dir: &Path) -> Self {
        Self {
            properties: project_dir.join(".vscode").join("c_cpp_properties.json"),
            config: project_dir.join(".clangd"),
        }
    }
}

/// How failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Invoked by a developer; errors are returned.
    Standalone,
    /// Invoked from the build; errors are logged and never fail the build.
    Hook,
}

/// What a generator run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No properties file, nothing to do.
    MissingInput,
    /// The config is at least as new as the properties file.
    UpToDate,
    Written,
    /// Generation failed in [`RunMode::Hook`]; the error was logged.
    Failed,
}

/// The parts of the first properties configuration clangd cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub include_paths: Vec<String>,
    pub defines: Vec<String>,
    pub cpp_standard: String,
    /// Parsed for completeness, clangd picks the C standard itself.
    pub c_standard: String,
    pub compiler_path: String,
}

#[derive(Debug, Deserialize)]
struct Properties {
    configurations: Option<Vec<PropertiesConfiguration>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertiesConfiguration {
    include_path: Option<Vec<Option<String>>>,
    defines: Option<Vec<Option<String>>>,
    cpp_standard: Option<String>,
    c_standard: Option<String>,
    compiler_path: Option<String>,
}

fn non_empty(entries: Option<Vec<Option<String>>>) -> Vec<String> {
    entries
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|entry| !entry.is_empty())
        .collect()
}

impl CompilerConfig {
    /// Parse the properties file contents, comments allowed.
    pub fn from_properties(text: &str) -> Result<Self, Error> {
        let properties: Properties = jsonc::from_str(text).map_err(Error::Parse)?;
        let config = properties
            .configurations
            .and_then(|configurations| configurations.into_iter().next())
            .ok_or(Error::NoConfigurations)?;
        Ok(Self {
            include_paths: non_empty(config.include_path),
            defines: non_empty(config.defines),
            cpp_standard: config
                .cpp_standard
                .unwrap_or_else(|| DEFAULT_CPP_STANDARD.to_owned()),
            c_standard: config
                .c_standard
                .unwrap_or_else(|| DEFAULT_C_STANDARD.to_owned()),
            compiler_path: config.compiler_path.unwrap_or_default(),
        })
    }
}

/// libstdc++ include directories bundled with the Xtensa toolchain the
/// compiler path points into. Empty for any other compiler.
pub fn toolchain_includes(compiler_path: &str) -> Vec<String> {
    if !compiler_path.contains(XTENSA_TOOLCHAIN_MARKER) {
        return Vec::new();
    }
    let Some((base, _)) = compiler_path.split_once("/bin/") else {
        return Vec::new();
    };
    if base.is_empty() {
        return Vec::new();
    }
    let cxx = format!("{base}/{XTENSA_TARGET_TRIPLE}/include/c++/{XTENSA_LIBSTDCXX_VERSION}");
    vec![cxx.clone(), format!("{cxx}/{XTENSA_TARGET_TRIPLE}")]
}

/// Contents of a `.clangd` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClangdConfig {
    pub cpp_standard: String,
    pub toolchain_includes: Vec<String>,
    pub defines: Vec<String>,
    pub include_paths: Vec<String>,
}

impl ClangdConfig {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            cpp_standard: config.cpp_standard.clone(),
            toolchain_includes: toolchain_includes(&config.compiler_path),
            defines: config.defines.clone(),
            include_paths: config.include_paths.clone(),
        }
    }

    /// `CompileFlags.Add`, in file order.
    pub fn add_flags(&self) -> Vec<String> {
        let mut flags = vec!["-fno-rtti".to_owned(), format!("-std={}", self.cpp_standard)];
        flags.extend(self.toolchain_includes.iter().map(|path| format!("-isystem{path}")));
        flags.extend(self.defines.iter().map(|define| format!("-D{define}")));
        // -isystem rather than -I so clangd does not report problems inside
        // framework and vendor headers.
        flags.extend(self.include_paths.iter().map(|path| format!("-isystem{path}")));
        flags
    }
}

/// Quote a YAML list item so that clangd reads back exactly `value`.
///
/// Double quoted scalars treat `\` as an escape, so anything with a backslash
/// or a quote goes into a single quoted scalar where only `'` needs doubling.
pub fn yaml_quote(value: &str) -> String {
    if value.contains('"') || value.contains('\\') {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        format!("\"{value}\"")
    }
}

impl fmt::Display for ClangdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CompileFlags:")?;
        writeln!(f, "  Add:")?;
        writeln!(f, "    # Compiler flags")?;
        item(f, "-fno-rtti")?;
        item(f, &format!("-std={}", self.cpp_standard))?;
        writeln!(f)?;

        if !self.toolchain_includes.is_empty() {
            writeln!(f, "    # ESP32 Toolchain C++ includes")?;
            for path in &self.toolchain_includes {
                item(f, &format!("-isystem{path}"))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "    # Defines")?;
        for define in &self.defines {
            item(f, &format!("-D{define}"))?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "    # Include paths (using -isystem to suppress errors from these headers)"
        )?;
        for path in &self.include_paths {
            item(f, &format!("-isystem{path}"))?;
        }
        writeln!(f)?;

        writeln!(f, "  Remove:")?;
        writeln!(f, "    # Remove problematic flags that clangd doesn't understand")?;
        for flag in REMOVE_FLAGS {
            item(f, flag)?;
        }
        writeln!(f)?;

        writeln!(f, "Diagnostics:")?;
        writeln!(f, "  UnusedIncludes: None")?;
        writeln!(f, "  MissingIncludes: None")?;
        writeln!(f)?;

        writeln!(f, "Index:")?;
        writeln!(f, "  Background: Build")
    }
}

fn item(f: &mut fmt::Formatter<'_>, flag: &str) -> fmt::Result {
    writeln!(f, "    - {}", yaml_quote(flag))
}

/// Whether `config` is missing or older than `properties`.
pub fn needs_regeneration(properties: &Path, config: &Path) -> Result<bool, Error> {
    let config_modified = match std::fs::metadata(config) {
        Ok(metadata) => metadata.modified().map_err(Error::Stat)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(Error::Stat(e)),
    };
    let properties_modified = std::fs::metadata(properties)
        .and_then(|metadata| metadata.modified())
        .map_err(Error::Stat)?;
    Ok(properties_modified > config_modified)
}

/// Regenerate the config if the properties file changed since the last run.
pub fn generate(paths: &Paths) -> Result<Outcome, Error> {
    if !paths.properties.exists() {
        tracing::warn!(
            "{} not found (skipping .clangd generation)",
            paths.properties.display()
        );
        return Ok(Outcome::MissingInput);
    }

    if !needs_regeneration(&paths.properties, &paths.config)? {
        tracing::debug!("{} is up to date", paths.config.display());
        return Ok(Outcome::UpToDate);
    }

    let text = std::fs::read_to_string(&paths.properties).map_err(Error::Read)?;
    let config = ClangdConfig::new(&CompilerConfig::from_properties(&text)?);
    atomic::write(&paths.config, config.to_string().as_bytes()).map_err(Error::Write)?;
    tracing::info!("generated {}", paths.config.display());
    Ok(Outcome::Written)
}

/// [`generate`], with errors swallowed in [`RunMode::Hook`].
pub fn run(paths: &Paths, mode: RunMode) -> Result<Outcome, Error> {
    match (generate(paths), mode) {
        (Err(e), RunMode::Hook) => {
            tracing::error!("failed to generate .clangd: {e}");
            Ok(Outcome::Failed)
        }
        (result, _) => result,
    }
}

#[derive(Debug)]
pub enum Error {
    NoConfigurations,
    Parse(serde_json::Error),
    Read(std::io::Error),
    Stat(std::io::Error),
    Write(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoConfigurations => {
                write!(f, "no configurations found in c_cpp_properties.json")
            }
            Error::Parse(e) => write!(f, "invalid c_cpp_properties.json: {e}"),
            Error::Read(e) => write!(f, "failed to read c_cpp_properties.json: {e}"),
            Error::Stat(e) => write!(f, "failed to read file timestamps: {e}"),
            Error::Write(e) => write!(f, "failed to write .clangd: {e}"),
        }
    }
}

impl std::error::Error for Error {}
