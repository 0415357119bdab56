//! Command line arguments.

use std::path::PathBuf;

#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    /// Log debug output.
    #[clap(short, long, global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Print the program name, `<env>_fw_<version>`.
    ProgName {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print the BUILD_DATE compiler define.
    BuildDate {
        /// Date to use instead of today, as YYYYMMDD.
        #[clap(long)]
        date: Option<String>,
    },
    /// Generate .clangd from .vscode/c_cpp_properties.json.
    Clangd {
        /// Project root. Defaults to the current directory.
        #[clap(long)]
        project_dir: Option<PathBuf>,
        /// Properties file, defaults to <project-dir>/.vscode/c_cpp_properties.json.
        #[clap(short, long)]
        input: Option<PathBuf>,
        /// Config file to write, defaults to <project-dir>/.clangd.
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Running as a build hook: log errors instead of failing.
        #[clap(long)]
        hook: bool,
    },
    /// Write the web flasher manifest into the build directory.
    Manifest {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Run the pre build hooks and print the resulting build settings.
    PreBuild {
        #[command(flatten)]
        context: ContextArgs,
        /// Date to use instead of today, as YYYYMMDD.
        #[clap(long)]
        date: Option<String>,
    },
    /// Run the actions registered for after the program is built.
    PostBuild {
        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(clap::Args)]
pub struct ContextArgs {
    /// Path to the build context file.
    #[clap(long, short)]
    pub context: PathBuf,
    /// Build directory, defaults to <project>/.pio/build/<env>.
    #[clap(long)]
    pub build_dir: Option<PathBuf>,
    /// Board MCU, e.g. "esp32s3".
    #[clap(long)]
    pub mcu: Option<String>,
}
