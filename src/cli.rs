use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task manager: tasks, subtasks and categories kept as JSON files.
/// Storage defaults to ~/.task-manager or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "tm", version, about = "Personal task management CLI")]
pub struct Cli {
    /// Directory holding tasks.json, categories.json and theme.json.
    #[arg(long, global = true, env = "TM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The data directory: the flag or environment value, else `$HOME/.task-manager`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".task-manager")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["tm", "list", "--data-dir", "/tmp/tm-data"]).unwrap();
        assert_eq!(cli.resolve_data_dir(), PathBuf::from("/tmp/tm-data"));
    }

    #[test]
    fn stats_months_is_bounded() {
        let cli = Cli::try_parse_from(["tm", "stats", "--months", "24"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats { months: 24 }));
        assert!(Cli::try_parse_from(["tm", "stats", "--months", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["tm", "stats", "--months", "1201"]).is_err());
    }

    #[test]
    fn command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
