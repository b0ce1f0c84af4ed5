mod commands;
mod logging;
mod progress;

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, HitArgs, StatsArgs};
use dotenv::dotenv;
use local_osu_core::config::{self, AppConfig};
use local_osu_core::packets::BanchoEncoder;
use local_osu_core::pp::{self, LocalScore};
use local_osu_core::profile::{load_modified_beatmaps, ProfileStore};
use local_osu_core::setup::SetupWizard;
use local_osu_core::stats::OsuDailyClient;
use local_osu_core::updater::{local_version, HttpRemote, SelfUpdater, ShellInstaller, UpdateCheck};
use local_osu_core::utils::prompt::Prompter;
use local_osu_core::utils::{is_path, is_wsl};
use local_osu_core::{get_grade, Mods, Player, StatsAggregator};
use progress::CliReporter;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Update { force, root }) => run_update(&config, force, root).await,
        Some(Commands::CheckUpdate { root }) => run_check_update(&config, root).await,
        Some(Commands::Setup { output }) => run_setup(&output),
        Some(Commands::PrintConfig) => config
            .redacted()
            .map(|redacted| println!("{:#}", redacted))
            .map_err(anyhow::Error::from),
        Some(Commands::SetConfig { key, value, file }) => run_set_config(&file, &key, &value),
        Some(Commands::Stats(stats)) => run_stats(&config, stats).await,
        Some(Commands::Grade(hits)) => run_grade(&hits),
        Some(Commands::Pp {
            beatmap,
            combo,
            hits,
        }) => run_pp(&beatmap, combo, &hits),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn install_root(root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => env::current_dir().context("cannot determine working directory"),
    }
}

fn build_updater(
    config: &AppConfig,
    root: &Path,
) -> anyhow::Result<SelfUpdater<HttpRemote, ShellInstaller>> {
    let remote = HttpRemote::new(&config.updater)?;
    let installer = ShellInstaller::new(config.updater.install_command.clone());
    Ok(SelfUpdater::new(remote, installer, root, local_version(root))
        .with_dependency_manifest(config.updater.dependency_manifest.clone()))
}

async fn run_update(config: &AppConfig, force: bool, root: Option<PathBuf>) -> anyhow::Result<()> {
    if !config.auto_update && !force {
        let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
        if !prompter.confirm("Auto update is disabled. Update anyway?", Some(false))? {
            info!("Skipping update");
            return Ok(());
        }
    }

    let root = install_root(root)?;
    let updater = build_updater(config, &root)?;
    let reporter = CliReporter::new();

    let Some(report) = updater.run(&reporter).await else {
        return Ok(());
    };

    info!(
        "{} -> {}: {} directories, {} written, {} deleted, {} already gone",
        report.from_version,
        report.to_version.green(),
        format!("{}", report.directories_created).cyan(),
        format!("{}", report.files_written).cyan(),
        format!("{}", report.files_deleted).cyan(),
        report.already_absent,
    );
    for failure in &report.failures {
        error!("{} {}: {}", "failed".red(), failure.path, failure.reason);
    }
    if let Some(install) = &report.dependency_install {
        info!("Dependency install: {:?}", install);
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(anyhow!(
            "update to {} was only partially applied",
            report.to_version
        ))
    }
}

async fn run_check_update(config: &AppConfig, root: Option<PathBuf>) -> anyhow::Result<()> {
    let root = install_root(root)?;
    let updater = build_updater(config, &root)?;

    match updater.check().await {
        UpdateCheck::UpToDate { version } => {
            println!("{} Up to date ({})", "✓".green(), version);
        }
        UpdateCheck::Available(manifest) => {
            println!(
                "{} Update available: {} -> {} ({} changes)",
                "↻".cyan(),
                updater.local_version(),
                manifest.version.green(),
                manifest.item_count()
            );
        }
        UpdateCheck::Unavailable(reason) => {
            println!("{} Could not check for updates: {}", "✗".red(), reason);
        }
    }
    Ok(())
}

fn run_setup(output: &Path) -> anyhow::Result<()> {
    let config = SetupWizard::new(io::stdin().lock(), io::stdout())
        .using_wsl(is_wsl())
        .run()?;
    config.save(output)?;
    println!("{} Saved configuration to {}", "✓".green(), output.display());
    Ok(())
}

fn run_set_config(file: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = config::load_from(&file.to_string_lossy())?;
    config.set_value(key, value)?;
    config.save(file)?;
    info!("Set {} in {}", key.cyan(), file.display());
    Ok(())
}

fn parse_mods(raw: Option<&str>) -> anyhow::Result<Option<Mods>> {
    raw.map(|m| m.parse::<Mods>().with_context(|| format!("invalid mods '{}'", m)))
        .transpose()
}

async fn run_stats(config: &AppConfig, args: StatsArgs) -> anyhow::Result<()> {
    let profiles = is_path(&args.profiles)
        .ok_or_else(|| anyhow!("{} is not a file", args.profiles.display()))?;
    let store = ProfileStore::load(&profiles)?;
    let profile = store
        .get(&args.name)
        .ok_or_else(|| anyhow!("no profile named '{}'", args.name))?;
    let filter = parse_mods(args.mods.as_deref())?;

    let ranks = OsuDailyClient::new(
        config.osu_daily_api_key.clone(),
        config.updater.http_timeout(),
    )?;
    if !ranks.is_enabled() {
        info!("No osu!daily api key configured, rank will show as 1");
    }

    let modified = args
        .modified
        .as_deref()
        .map(load_modified_beatmaps)
        .transpose()?;
    let aggregator = StatsAggregator::from_config(ranks, BanchoEncoder, config, modified);

    let mut player = Player::new(args.name.as_str(), false);
    player.mode = args.mode;
    let summary = aggregator.update(&mut player, profile, filter).await;

    println!(
        "{}: {} | {} | {} | {} plays",
        player.name.bold(),
        format!("{}pp", player.pp).green(),
        format!("{:.2}%", player.accuracy).cyan(),
        format!("#{}", player.rank).yellow(),
        player.playcount,
    );
    println!(
        "  {} eligible scores, {} top plays, {:.3} raw pp",
        summary.scores_considered, summary.top_plays, summary.raw_pp
    );
    Ok(())
}

fn run_grade(hits: &HitArgs) -> anyhow::Result<()> {
    let mods = parse_mods(hits.mods.as_deref())?.unwrap_or_default();
    let grade = get_grade(hits.n300, hits.n100, hits.n50, hits.nmiss, mods)?;
    println!("{}", grade.to_string().bold());
    Ok(())
}

fn run_pp(beatmap: &Path, combo: Option<u32>, hits: &HitArgs) -> anyhow::Result<()> {
    let mods = parse_mods(hits.mods.as_deref())?.unwrap_or_default();
    let map = pp::load_beatmap(beatmap)?;
    let score = LocalScore {
        n300: hits.n300,
        n100: hits.n100,
        n50: hits.n50,
        nmiss: hits.nmiss,
        max_combo: combo,
        mods: mods.bits(),
    };

    let result = pp::calculate(&score, &map, None);
    println!(
        "{} at {}",
        format!("{:.2}pp", result.pp).green(),
        format!("{:.2}%", result.accuracy).cyan()
    );
    Ok(())
}
