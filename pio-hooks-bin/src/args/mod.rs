use {
    chrono::NaiveDate,
    clap::Parser,
    pio_hooks::{build_date, clangd, BuildContext},
    std::path::{Path, PathBuf},
};

mod cli;
mod config;

pub use config::Error as ConfigError;

/// Program arguments loaded from the CLI and the build context file.
#[derive(Debug, Clone)]
pub struct Args {
    pub verbose: bool,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    /// Print the program name.
    ProgName { context: BuildContext },
    /// Print the build date define.
    BuildDate { date: NaiveDate },
    /// Generate the clangd config.
    Clangd {
        paths: clangd::Paths,
        mode: clangd::RunMode,
    },
    /// Write the web flasher manifest.
    Manifest { context: BuildContext },
    /// Run the pre build hooks.
    PreBuild {
        context: BuildContext,
        date: NaiveDate,
    },
    /// Run the post build hooks.
    PostBuild {
        context: BuildContext,
        date: NaiveDate,
    },
}

pub fn args<I, T>(args: I) -> Result<Args, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Args::try_parse_from(args).map_err(Error::Cli)?;
    let command = match cli.command {
        cli::Command::ProgName { context } => Command::ProgName {
            context: load_context(context)?,
        },
        cli::Command::BuildDate { date } => Command::BuildDate {
            date: date_or_today(date)?,
        },
        cli::Command::Clangd {
            project_dir,
            input,
            output,
            hook,
        } => {
            let defaults =
                clangd::Paths::for_project(&project_dir.unwrap_or_else(|| PathBuf::from(".")));
            Command::Clangd {
                paths: clangd::Paths {
                    properties: input.unwrap_or(defaults.properties),
                    config: output.unwrap_or(defaults.config),
                },
                mode: if hook {
                    clangd::RunMode::Hook
                } else {
                    clangd::RunMode::Standalone
                },
            }
        }
        cli::Command::Manifest { context } => Command::Manifest {
            context: load_context(context)?,
        },
        cli::Command::PreBuild { context, date } => Command::PreBuild {
            context: load_context(context)?,
            date: date_or_today(date)?,
        },
        cli::Command::PostBuild { context } => Command::PostBuild {
            context: load_context(context)?,
            date: date_or_today(None)?,
        },
    };
    Ok(Args {
        verbose: cli.verbose,
        command,
    })
}

fn date_or_today(date: Option<String>) -> Result<NaiveDate, Error> {
    match date {
        Some(date) => build_date::parse(&date).map_err(|_| Error::InvalidDate(date)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Load the context file and apply the CLI overrides. Error if anything is
/// specified both on the CLI and in the context file.
fn load_context(args: cli::ContextArgs) -> Result<BuildContext, Error> {
    let config = config::Config::load(&args.context)?;

    let build_dir = match (args.build_dir, config.build_dir.is_some()) {
        (Some(_), true) => return Err(Error::BuildDirInContextAndCli),
        (build_dir, _) => build_dir,
    };
    let mcu = match (args.mcu, config.board.contains_key(consts::BOARD_MCU_KEY)) {
        (Some(_), true) => return Err(Error::McuInContextAndCli),
        (mcu, _) => mcu,
    };

    let base = args
        .context
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut context = config.into_context(base, build_dir);
    if let Some(mcu) = mcu {
        context = context.with_board_config(consts::BOARD_MCU_KEY, mcu);
    }
    Ok(context)
}

#[derive(Debug)]
pub enum Error {
    BuildDirInContextAndCli,
    Cli(clap::Error),
    Config(ConfigError),
    InvalidDate(String),
    McuInContextAndCli,
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BuildDirInContextAndCli => {
                write!(f, "build dir specified in both context and cli")
            }
            Error::Cli(e) => write!(f, "{}", e.render().ansi()),
            Error::Config(e) => write!(f, "config error: {e}"),
            Error::InvalidDate(date) => {
                write!(f, r#"invalid date: "{date}", expected YYYYMMDD"#)
            }
            Error::McuInContextAndCli => write!(f, "mcu specified in both context and cli"),
        }
    }
}

impl std::error::Error for Error {}
