use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::info;

use aircombat_shared::*;
use aircombat_sim::observation::layout;
use aircombat_sim::{run_episodes, Arena};

#[derive(Parser)]
#[command(name = "aircombat", about = "Air combat simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes between two built-in policies
    Run {
        #[command(flatten)]
        matchup: Matchup,

        /// Number of episodes to play
        #[arg(long, default_value_t = 1)]
        episodes: usize,

        /// Write the episode summaries as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Play one episode per seed in parallel and tally the results
    Series {
        #[command(flatten)]
        matchup: Matchup,

        /// Number of seeds, starting at --seed
        #[arg(long, default_value_t = 16)]
        seeds: u64,
    },

    /// Print the observation layout for a roster
    Inspect {
        /// Agents per team
        #[arg(long, default_value_t = 1)]
        team_size: u32,
    },
}

#[derive(clap::Args, Clone)]
struct Matchup {
    /// Red team policy (learned, manual, greedy, gravity)
    #[arg(long, default_value = "greedy")]
    red: PolicyKind,

    /// Blue team policy (learned, manual, greedy, gravity)
    #[arg(long, default_value = "gravity")]
    blue: PolicyKind,

    /// Agents per team
    #[arg(long, default_value_t = 1)]
    team_size: u32,

    /// Random seed for spawn placement
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Arena JSON file; replaces --red/--blue/--team-size
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use showcase timing (result pauses, periodic evaluation)
    #[arg(long)]
    showcase: bool,

    /// Give up on an episode after this many ticks
    #[arg(long, default_value_t = 50_000)]
    max_ticks: u64,
}

impl Matchup {
    fn arena(&self) -> Result<ArenaConfig> {
        let config = match &self.config {
            Some(path) => load_arena(path)?,
            None => ArenaConfig::versus(self.red, self.blue, self.team_size),
        };
        Ok(config.with_seed(self.seed))
    }

    fn sim(&self) -> SimConfig {
        if self.showcase {
            SimConfig::showcase()
        } else {
            SimConfig::training()
        }
    }
}

fn load_arena(path: &Path) -> Result<ArenaConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read arena config: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid arena config: {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            matchup,
            episodes,
            output,
        } => cmd_run(&matchup, episodes, output),
        Commands::Series { matchup, seeds } => cmd_series(&matchup, seeds),
        Commands::Inspect { team_size } => cmd_inspect(team_size),
    }
}

fn cmd_run(matchup: &Matchup, episodes: usize, output: Option<PathBuf>) -> Result<()> {
    let arena = matchup.arena()?;
    let sim = matchup.sim();
    println!(
        "Running {} episode(s): {} agents, seed={}, mode={:?}",
        episodes,
        arena.agents.len(),
        arena.seed,
        sim.mode
    );

    let max_ticks = matchup.max_ticks.saturating_mul(episodes as u64);
    let summaries = run_episodes(&arena, sim, episodes, max_ticks)?;

    for summary in &summaries {
        println!();
        println!("=== Episode {} ===", summary.episode);
        println!("Result:     {:?}", summary.result);
        println!("Reason:     {:?}", summary.reason);
        println!(
            "Final tick: {} ({:.1}s)",
            summary.final_tick, summary.duration_secs
        );
        for agent in &summary.agents {
            println!(
                "  {:<8} reward={:>8.3} ammo={:>4} {}",
                agent.id.to_string(),
                agent.reward,
                agent.ammunition,
                if agent.destroyed { "destroyed" } else { "" }
            );
        }
    }
    if summaries.len() < episodes {
        println!(
            "\nStopped after {} of {} episodes (tick limit)",
            summaries.len(),
            episodes
        );
    }
    if let Some(last) = summaries.last() {
        let s = last.scoreboard;
        println!(
            "\nScoreboard: red={} blue={} draws={}",
            s.red_wins, s.blue_wins, s.draws
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&summaries)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write summaries: {}", path.display()))?;
        println!("\nSummaries written to {}", path.display());
    }
    Ok(())
}

fn cmd_series(matchup: &Matchup, seeds: u64) -> Result<()> {
    let base = matchup.arena()?;
    let sim = matchup.sim();
    let first = base.seed;
    info!(seeds, first, "starting series");

    let results: Vec<Option<EpisodeSummary>> = (first..first + seeds)
        .into_par_iter()
        .map(|seed| {
            let arena = base.clone().with_seed(seed);
            run_episodes(&arena, sim, 1, matchup.max_ticks).map(|mut s| s.pop())
        })
        .collect::<Result<_, _>>()?;

    let mut board = Scoreboard::default();
    let mut truncated = 0;
    let mut unfinished = 0;
    let mut ticks = 0u64;
    for summary in &results {
        match summary {
            Some(s) if s.result.is_terminal() => {
                board.record(s.result);
                ticks += s.final_tick;
            }
            Some(_) => truncated += 1,
            None => unfinished += 1,
        }
    }

    println!("=== Series: {} seeds from {} ===", seeds, first);
    println!("  red wins:  {}", board.red_wins);
    println!("  blue wins: {}", board.blue_wins);
    println!("  draws:     {}", board.draws);
    if truncated > 0 {
        println!("  step budget reached: {}", truncated);
    }
    if unfinished > 0 {
        println!("  unfinished:          {}", unfinished);
    }
    if board.total() > 0 {
        let mean = ticks as f32 / board.total() as f32;
        println!("  mean length: {:.0} ticks ({:.1}s)", mean, mean * sim.dt);
    }
    Ok(())
}

fn cmd_inspect(team_size: u32) -> Result<()> {
    let config = ArenaConfig::versus(PolicyKind::Learned, PolicyKind::Greedy, team_size);
    let arena = Arena::new(&config)?;
    let boundaries = arena.boundaries().len();

    println!(
        "Observation: {} floats ({} agents, {} boundaries, {} other-agent slots)",
        observation_len(boundaries),
        arena.len(),
        boundaries,
        OTHER_SLOTS
    );
    for (name, range) in layout(boundaries) {
        println!("  [{:>3}..{:>3})  {}", range.start, range.end, name);
    }
    println!("Action branches: {:?}", ACTION_BRANCHES);
    Ok(())
}
