use {
    pio_hooks::BuildContext,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// Build context file, the values PlatformIO would expose to the scripts.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub env: String,
    pub project_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub prog_name: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub board: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub packages: BTreeMap<String, PathBuf>,
}

/// `platformio.ini` values are strings; accept `1.4` as well as `"1.4"`.
fn option_string(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let config = std::fs::read_to_string(path)?;
        toml::from_str(&config).map_err(Into::into)
    }

    /// Build the context, resolving relative paths against `base`, the
    /// directory of the config file. `build_dir` comes from the CLI and is
    /// used as given.
    pub fn into_context(self, base: &Path, build_dir: Option<PathBuf>) -> BuildContext {
        let project_dir = match self.project_dir {
            Some(project_dir) => base.join(project_dir),
            None => base.to_path_buf(),
        };
        let build_dir = match (build_dir, self.build_dir) {
            (Some(build_dir), _) => build_dir,
            (None, Some(build_dir)) => base.join(build_dir),
            (None, None) => project_dir.join(".pio").join("build").join(&self.env),
        };
        let mut context = BuildContext::new(self.env, project_dir, build_dir);
        if let Some(prog_name) = self.prog_name {
            context = context.with_prog_name(prog_name);
        }
        for (name, value) in self.options {
            context = context.with_option(name, option_string(value));
        }
        for (key, value) in self.board {
            context = context.with_board_config(key, option_string(value));
        }
        for (name, dir) in self.packages {
            context = context.with_package(name, base.join(dir));
        }
        context
    }
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "failed to read config file: {e}"),
            Error::Toml(e) => write!(f, "config file format error in TOML: {e}"),
        }
    }
}

impl std::error::Error for Error {}
