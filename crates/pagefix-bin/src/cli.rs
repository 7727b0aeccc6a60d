use clap::Parser;
use pagefix_core::{DEFAULT_FILE_NAME, DEFAULT_ROOT};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagefix")]
#[command(version)]
#[command(about = "Move component imports in page files into the marketing directory")]
#[command(long_about = "Walks a directory tree and rewrites the import paths of shared site components \
(site-header, site-footer, features/*) to their new location under @/components/marketing in every matching page file.")]
pub struct Cli {
    #[arg(
        env = "PAGEFIX_ROOT",
        default_value = DEFAULT_ROOT,
        help = "Directory to search for page files"
    )]
    pub root: PathBuf,

    #[arg(
        long,
        env = "PAGEFIX_FILE_NAME",
        default_value = DEFAULT_FILE_NAME,
        help = "Exact file name of the files to rewrite"
    )]
    pub file_name: String,

    #[arg(long, help = "Show pending changes without writing them")]
    pub dry_run: bool,

    #[arg(
        short,
        long,
        conflicts_with = "dry_run",
        help = "Interactive mode - prompt for each change"
    )]
    pub interactive: bool,

    #[arg(long, help = "Record failing files and continue with the rest")]
    pub keep_going: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pagefix"]).unwrap();

        if std::env::var_os("PAGEFIX_ROOT").is_none() {
            assert_eq!(cli.root, PathBuf::from("frontend/src/app/(marketing)"));
        }
        if std::env::var_os("PAGEFIX_FILE_NAME").is_none() {
            assert_eq!(cli.file_name, "page.tsx");
        }
        assert!(!cli.dry_run);
        assert!(!cli.interactive);
        assert!(!cli.keep_going);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "pagefix",
            "site/app",
            "--file-name",
            "layout.tsx",
            "--dry-run",
            "--keep-going",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("site/app"));
        assert_eq!(cli.file_name, "layout.tsx");
        assert!(cli.dry_run);
        assert!(!cli.interactive);
        assert!(cli.keep_going);
        assert!(cli.verbose);
    }

    #[test]
    fn test_interactive_flag() {
        let cli = Cli::try_parse_from(["pagefix", "-i"]).unwrap();

        assert!(cli.interactive);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_dry_run_conflicts_with_interactive() {
        let err = Cli::try_parse_from(["pagefix", "--dry-run", "--interactive"]).unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["pagefix", "-v", "-q"]).is_err());
    }
}
