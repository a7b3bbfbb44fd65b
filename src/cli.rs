use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{Options, PrefixPolicy};

#[derive(Parser, Debug)]
#[command(name = "zipack")]
#[command(version)]
#[command(about = "Cached read-only access to files inside a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipack -a sqlfiles.zip --prefix-stem cat default/selectDual.sql\n  \
  zipack -a site.zip ls\n  \
  zipack -c zipack.toml serve --listen 0.0.0.0:8080")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// ZIP or JAR archive to read
    #[arg(short = 'a', long, value_name = "FILE", global = true)]
    pub archive: Option<PathBuf>,

    /// TOML options file (archive, preload, prefix)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Look paths up under a folder named after the archive
    #[arg(long, global = true, conflicts_with = "prefix")]
    pub prefix_stem: bool,

    /// Look paths up under this folder
    #[arg(long, value_name = "DIR", global = true)]
    pub prefix: Option<String>,

    /// Verbose logging (-vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write files to stdout
    Cat {
        /// Logical paths of the files
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// List archive entries
    Ls,

    /// Serve the archive over HTTP
    Serve {
        /// Address to listen on
        #[arg(short = 'l', long, default_value = "127.0.0.1:8080")]
        listen: SocketAddr,

        /// Path to load before serving (repeatable)
        #[arg(short = 'p', long = "preload", value_name = "PATH")]
        preload: Vec<String>,
    },
}

impl Cli {
    /// Merge the options file, if any, with command line flags.
    ///
    /// Flags win over the file. Returns `None` when no archive was given
    /// either way.
    pub fn options(&self, file: Option<Options>) -> Option<Options> {
        let mut options = match (file, &self.archive) {
            (Some(mut options), Some(archive)) => {
                options.archive = archive.clone();
                options
            }
            (Some(options), None) => options,
            (None, Some(archive)) => Options::new(archive.clone()),
            (None, None) => return None,
        };

        if self.prefix_stem {
            options.prefix = PrefixPolicy::ArchiveStem;
        } else if let Some(prefix) = &self.prefix {
            options.prefix = PrefixPolicy::Custom(prefix.clone());
        }

        if let Command::Serve { preload, .. } = &self.command {
            if !preload.is_empty() {
                options.preload = preload.clone();
            }
        }

        Some(options)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "zipack=warn",
            1 => "zipack=info",
            _ => "zipack=debug",
        }
    }
}
