// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The build environment seen by the hooks.
//!
//! PlatformIO hands its scripts a global, mutable SCons environment. Here the
//! hooks only get the narrow [`BuildEnv`] capability set, which keeps every hook
//! testable against an in-memory [`BuildContext`].

use {
    core::fmt,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// Read and write access to the build environment.
pub trait BuildEnv {
    /// Name of the active environment, e.g. `esp32dev`.
    fn env_name(&self) -> &str;

    /// Value of a project option from `platformio.ini`.
    fn project_option(&self, name: &str) -> Option<&str>;

    /// Value of a project option, or `default` when the option is not set.
    fn project_option_or(&self, name: &str, default: &str) -> String {
        self.project_option(name).unwrap_or(default).to_owned()
    }

    /// Board manifest lookup by dotted key, e.g. `build.mcu`.
    fn board_config(&self, key: &str) -> Option<&str>;

    /// Project root directory.
    fn project_dir(&self) -> &Path;

    /// Build output directory of the active environment.
    fn build_dir(&self) -> &Path;

    /// Installation directory of a platform package.
    fn package_dir(&self, name: &str) -> Option<&Path>;

    /// Base file name of the program, without extension.
    fn prog_name(&self) -> &str;

    fn set_prog_name(&mut self, name: String);

    fn append_define(&mut self, define: Define);

    /// Run `action` after `target` has been built.
    fn add_post_action(&mut self, target: Target, action: PostAction);
}

/// Callback registered with [`BuildEnv::add_post_action`].
pub type PostAction = fn(&dyn BuildEnv);

/// Build targets post actions can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The linked program image (`buildprog`).
    Program,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Program => "buildprog",
        }
    }
}

/// A preprocessor define, `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Compiler flag for this define, e.g. `-DBUILD_DATE="20240409"`.
    pub fn flag(&self) -> String {
        format!("-D{self}")
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// In-memory build environment.
#[derive(Debug, Clone)]
pub struct BuildContext {
    env_name: String,
    project_dir: PathBuf,
    build_dir: PathBuf,
    prog_name: Option<String>,
    options: BTreeMap<String, String>,
    board: BTreeMap<String, String>,
    packages: BTreeMap<String, PathBuf>,
    defines: Vec<Define>,
    post_actions: Vec<(Target, PostAction)>,
}

impl BuildContext {
    pub fn new(
        env_name: impl Into<String>,
        project_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            env_name: env_name.into(),
            project_dir: project_dir.into(),
            build_dir: build_dir.into(),
            prog_name: None,
            options: BTreeMap::new(),
            board: BTreeMap::new(),
            packages: BTreeMap::new(),
            defines: Vec::new(),
            post_actions: Vec::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_board_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.board.insert(key.into(), value.into());
        self
    }

    pub fn with_package(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), dir.into());
        self
    }

    pub fn with_prog_name(mut self, name: impl Into<String>) -> Self {
        self.prog_name = Some(name.into());
        self
    }

    /// Defines appended so far, in order.
    pub fn defines(&self) -> &[Define] {
        &self.defines
    }

    /// Number of post actions registered for `target`.
    pub fn post_action_count(&self, target: Target) -> usize {
        self.post_actions.iter().filter(|(t, _)| *t == target).count()
    }

    /// Run the post actions registered for `target` in registration order.
    /// Returns how many ran.
    pub fn run_post_actions(&self, target: Target) -> usize {
        let mut ran = 0;
        for (_, action) in self.post_actions.iter().filter(|(t, _)| *t == target) {
            tracing::debug!("running post action for {}", target.name());
            action(self);
            ran += 1;
        }
        ran
    }
}

impl BuildEnv for BuildContext {
    fn env_name(&self) -> &str {
        &self.env_name
    }

    fn project_option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    fn board_config(&self, key: &str) -> Option<&str> {
        self.board.get(key).map(String::as_str)
    }

    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn package_dir(&self, name: &str) -> Option<&Path> {
        self.packages.get(name).map(PathBuf::as_path)
    }

    fn prog_name(&self) -> &str {
        self.prog_name.as_deref().unwrap_or(consts::DEFAULT_PROG_NAME)
    }

    fn set_prog_name(&mut self, name: String) {
        self.prog_name = Some(name);
    }

    fn append_define(&mut self, define: Define) {
        self.defines.push(define);
    }

    fn add_post_action(&mut self, target: Target, action: PostAction) {
        self.post_actions.push((target, action));
    }
}
