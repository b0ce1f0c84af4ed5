use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "local-osu")]
#[command(about = "Maintenance tools for a local osu! server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check for a new server version and install it
    Update {
        /// Update even when auto_update is disabled
        #[arg(long)]
        force: bool,

        /// Install directory (defaults to the working directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Report whether a new server version is available
    CheckUpdate {
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Walk through the first-run configuration wizard
    Setup {
        #[arg(long, default_value = "Config.toml")]
        output: PathBuf,
    },
    /// Print configuration values (credentials hidden)
    PrintConfig,
    /// Change a single configuration value
    SetConfig {
        /// Option name, dotted for sections (e.g. paths.songs)
        key: String,
        value: String,

        #[arg(long, default_value = "Config.toml")]
        file: PathBuf,
    },
    /// Recompute a player's pp, accuracy and rank from stored plays
    Stats(StatsArgs),
    /// Letter grade for a hit breakdown
    Grade(HitArgs),
    /// pp for a play on a beatmap file
    Pp {
        #[arg(long)]
        beatmap: PathBuf,

        /// Max combo reached; a full combo is assumed when omitted
        #[arg(long)]
        combo: Option<u32>,

        #[command(flatten)]
        hits: HitArgs,
    },
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Profiles collection (JSON keyed by player name)
    #[arg(long)]
    pub profiles: PathBuf,

    #[arg(long)]
    pub name: String,

    /// Only count plays with these mods (acronyms like HDHR or a bitmask)
    #[arg(long)]
    pub mods: Option<String>,

    /// Modified-beatmap list, left out of the totals when disable_funorange_maps is on
    #[arg(long)]
    pub modified: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub mode: u8,
}

#[derive(Debug, Args)]
pub struct HitArgs {
    #[arg(long, default_value_t = 0)]
    pub n300: u32,

    #[arg(long, default_value_t = 0)]
    pub n100: u32,

    #[arg(long, default_value_t = 0)]
    pub n50: u32,

    #[arg(long, default_value_t = 0)]
    pub nmiss: u32,

    #[arg(long)]
    pub mods: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pp_combo_is_optional() {
        let cli = Cli::try_parse_from(["local-osu", "pp", "--beatmap", "map.osu", "--n300", "10"])
            .unwrap();
        match cli.command {
            Some(Commands::Pp { combo, hits, .. }) => {
                assert_eq!(combo, None);
                assert_eq!(hits.n300, 10);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["local-osu", "pp", "--beatmap", "map.osu", "--combo", "812"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Pp {
                combo: Some(812),
                ..
            })
        ));
    }
}
