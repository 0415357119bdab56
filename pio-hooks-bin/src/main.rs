// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

use {
    colored::Colorize,
    pio_hooks::{clangd, hooks, manifest, progname, BuildEnv},
    std::{ffi::OsString, io::Write},
    tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

mod args;

#[cfg(test)]
mod tests;

fn main() -> std::process::ExitCode {
    main_args(
        std::env::args_os(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .into()
}

fn main_args<I, T>(args: I, mut stdout: impl Write, mut stderr: impl Write) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match run(args, &mut stdout) {
        Ok(()) => ExitCode(0),
        // --help and --version come through here as well.
        Err(Error::Args(args::Error::Cli(e))) if !e.use_stderr() => {
            write!(stdout, "{}", e.render()).expect("write help to stdout");
            ExitCode(0)
        }
        Err(Error::Args(e @ args::Error::Cli(_))) => {
            // Clap already does the "error: {}" formatting.
            writeln!(stderr, "{e}").expect("write error to stderr");
            ExitCode(1)
        }
        Err(e) => {
            writeln!(stderr, "{} {e}", "error:".bold().red()).expect("write error to stderr");
            ExitCode(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    // Already set when running more than once in the same process, as tests do.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn run<I, T>(args: I, mut stdout: impl Write) -> Result<(), Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = args::args(args)?;
    init_tracing(args.verbose);

    match args.command {
        args::Command::ProgName { mut context } => {
            let name = progname::apply(&mut context)?;
            writeln!(&mut stdout, "{name}").map_err(Error::Stdout)?;
        }
        args::Command::BuildDate { date } => {
            let define = pio_hooks::build_date::define_for(date);
            writeln!(&mut stdout, "{}", define.flag()).map_err(Error::Stdout)?;
        }
        args::Command::Clangd { paths, mode } => {
            let outcome = clangd::run(&paths, mode)?;
            let config = paths.config.display();
            let written = match outcome {
                clangd::Outcome::Written => writeln!(&mut stdout, "generated {config}"),
                clangd::Outcome::UpToDate => writeln!(&mut stdout, "{config} is up to date"),
                clangd::Outcome::MissingInput => writeln!(
                    &mut stdout,
                    "{} not found, skipped",
                    paths.properties.display()
                ),
                clangd::Outcome::Failed => writeln!(&mut stdout, "{config} not generated"),
            };
            written.map_err(Error::Stdout)?;
        }
        args::Command::Manifest { context } => {
            let (manifest, path) = manifest::generate(&context)?;
            writeln!(
                &mut stdout,
                "{} {} ({})",
                "manifest".bold(),
                path.display(),
                manifest.name
            )
            .map_err(Error::Stdout)?;
            for build in &manifest.builds {
                writeln!(&mut stdout, "{:10} {}", "chip".bold(), build.chip_family)
                    .map_err(Error::Stdout)?;
                for part in &build.parts {
                    let size = match std::fs::metadata(context.build_dir().join(&part.path)) {
                        Ok(metadata) => humansize::format_size(metadata.len(), humansize::BINARY),
                        Err(_) => "missing".to_owned(),
                    };
                    writeln!(
                        &mut stdout,
                        "0x{:06x} {:24} {size}",
                        part.offset,
                        part.path
                    )
                    .map_err(Error::Stdout)?;
                }
            }
        }
        args::Command::PreBuild { mut context, date } => {
            hooks::pre_build(&mut context, date)?;
            writeln!(&mut stdout, "PROGNAME={}", context.prog_name()).map_err(Error::Stdout)?;
            for define in context.defines() {
                writeln!(&mut stdout, "CPPDEFINE={}", define.flag()).map_err(Error::Stdout)?;
            }
        }
        args::Command::PostBuild { mut context, date } => {
            hooks::pre_build(&mut context, date)?;
            let ran = hooks::post_build(&context);
            tracing::debug!("ran {ran} post build action(s)");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExitCode(u8);

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        code.0.into()
    }
}

#[derive(Debug)]
enum Error {
    Args(args::Error),
    Clangd(clangd::Error),
    Manifest(manifest::Error),
    ProgName(progname::Error),
    Stdout(std::io::Error),
}

impl From<args::Error> for Error {
    fn from(e: args::Error) -> Self {
        Error::Args(e)
    }
}

impl From<clangd::Error> for Error {
    fn from(e: clangd::Error) -> Self {
        Error::Clangd(e)
    }
}

impl From<manifest::Error> for Error {
    fn from(e: manifest::Error) -> Self {
        Error::Manifest(e)
    }
}

impl From<progname::Error> for Error {
    fn from(e: progname::Error) -> Self {
        Error::ProgName(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Args(e) => write!(f, "{e}"),
            Error::Clangd(e) => write!(f, "failed to generate .clangd: {e}"),
            Error::Manifest(e) => write!(f, "{e}"),
            Error::ProgName(e) => write!(f, "{e}"),
            Error::Stdout(e) => write!(f, "failed to write to stdout: {e}"),
        }
    }
}

impl std::error::Error for Error {}
