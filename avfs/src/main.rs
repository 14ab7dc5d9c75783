use std::path::PathBuf;

use structopt::StructOpt;

mod commands;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(
        name = "l",
        visible_alias = "list",
        about = "List a directory of the archive"
    )]
    List {
        #[structopt(name = "snapshot", parse(from_os_str), help = "Path to the snapshot file")]
        archive: PathBuf,

        #[structopt(default_value = "", help = "Directory inside the archive")]
        path: String,
    },

    #[structopt(
        name = "s",
        visible_alias = "stat",
        about = "Show metadata for one entry"
    )]
    Stat {
        #[structopt(name = "snapshot", parse(from_os_str), help = "Path to the snapshot file")]
        archive: PathBuf,

        #[structopt(help = "Entry inside the archive")]
        path: String,
    },

    #[structopt(
        name = "x",
        visible_alias = "cat",
        about = "Write a file's content to standard output"
    )]
    Cat {
        #[structopt(name = "snapshot", parse(from_os_str), help = "Path to the snapshot file")]
        archive: PathBuf,

        #[structopt(help = "File inside the archive")]
        path: String,
    },

    #[structopt(
        name = "r",
        visible_alias = "readlink",
        about = "Print a symlink's raw target"
    )]
    Readlink {
        #[structopt(name = "snapshot", parse(from_os_str), help = "Path to the snapshot file")]
        archive: PathBuf,

        #[structopt(help = "Symlink inside the archive")]
        path: String,
    },

    #[structopt(
        name = "p",
        visible_alias = "pack",
        about = "Pack a host directory into a snapshot"
    )]
    Pack {
        #[structopt(parse(from_os_str), help = "Host directory to pack")]
        dir: PathBuf,

        #[structopt(name = "snapshot", parse(from_os_str), help = "Snapshot file to create")]
        archive: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "avfs",
    about = "Inspect archive snapshots through the read-only filesystem adapter."
)]
struct Options {
    #[structopt(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Options::from_args();
    match opts.command {
        Commands::List { archive, path } => commands::list(&archive, &path)?,
        Commands::Stat { archive, path } => commands::stat(&archive, &path)?,
        Commands::Cat { archive, path } => commands::cat(&archive, &path)?,
        Commands::Readlink { archive, path } => commands::readlink(&archive, &path)?,
        Commands::Pack { dir, archive } => commands::pack(&dir, &archive)?,
    }

    Ok(())
}
