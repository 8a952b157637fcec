//! # Warband Headless Driver
//!
//! Runs a seeded skirmish on a built-in map with no renderer: a simple
//! driver picks goals for the party and prints the narration.

use clap::Parser;
use log::{info, warn};
use warband::{
    BehaviorTable, Cell, CombatStats, Dice, Feature, Mobile, MobileId, Mode, Region, Simulation,
    SimulationConfig, TerrainGrid, WarbandError, WarbandResult, Weapon,
};

/// Command line arguments for the Warband driver.
#[derive(Parser, Debug)]
#[command(name = "warband")]
#[command(about = "Runs a headless Warband skirmish")]
#[command(version)]
struct Args {
    /// Random seed for the simulation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of scheduler drives
    #[arg(long, default_value_t = 400)]
    steps: u32,

    /// Simulation config as a JSON file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Monster archetypes as a JSON file
    #[arg(long)]
    bestiary: Option<std::path::PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

const MAP: &[&str] = &[
    "####################",
    "#......#...........#",
    "#......#....~~.....#",
    "#..........~~~.....#",
    "#......#...........#",
    "###.####.....O.....#",
    "#..................#",
    "#.....:::..........#",
    "#..................#",
    "####################",
];

fn main() -> WarbandResult<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .format_target(false)
        .init();

    info!("Starting Warband v{}", warband::VERSION);

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let behaviors = match &args.bestiary {
        Some(path) => BehaviorTable::from_json(&std::fs::read_to_string(path)?)?,
        None => BehaviorTable::default(),
    };

    let mut sim = build_skirmish(config, behaviors)?;
    run(&mut sim, args.steps)
}

/// Builds the demo region, party and monsters.
fn build_skirmish(config: SimulationConfig, behaviors: BehaviorTable) -> WarbandResult<Simulation> {
    let mut region = Region::new("Old Barracks", TerrainGrid::from_ascii(MAP)?);
    region.place_feature(Cell::new(5, 3), Feature::door())?;
    region.place_feature(Cell::new(1, 1), Feature::chest("a silver key"))?;
    region.place_feature(Cell::new(8, 17), Feature::fountain(5))?;
    region.place_feature(Cell::new(6, 9), Feature::trap(3))?;

    let sword = Weapon::new("sword", "slashes", Dice::new(1, 6, 1), 1);
    let bow = Weapon::new("bow", "shoots", Dice::new(1, 6, 0), 6);
    let party = vec![
        region.add_mobile(Mobile::hero("Aria", Cell::new(7, 2), CombatStats::new(20, 30, 65, sword.clone())))?,
        region.add_mobile(Mobile::hero("Bram", Cell::new(7, 2), CombatStats::new(16, 20, 60, bow)))?,
        region.add_mobile(Mobile::hero("Cyd", Cell::new(7, 2), CombatStats::new(14, 10, 55, sword)))?,
    ];

    let mut sim = Simulation::new(region, party, config)?.with_behaviors(behaviors);
    let claws = Weapon::new("claws", "claws", Dice::new(1, 4, 0), 1);
    let spear = Weapon::new("spear", "stabs", Dice::new(1, 6, 0), 1);
    sim.spawn_monster("goblin", "Snikt", Cell::new(2, 15), CombatStats::new(8, 10, 45, spear.clone()))?;
    sim.spawn_monster("goblin", "Grub", Cell::new(3, 16), CombatStats::new(8, 10, 45, spear))?;
    sim.spawn_monster("wolf", "Grey Wolf", Cell::new(7, 15), CombatStats::new(10, 15, 50, claws.clone()))?;
    sim.spawn_monster("rat", "Rat", Cell::new(1, 4), CombatStats::new(3, 0, 30, claws))?;
    Ok(sim)
}

/// Drives the simulation until the party falls, the monsters are gone, or
/// the step budget runs out.
fn run(sim: &mut Simulation, steps: u32) -> WarbandResult<()> {
    let waypoints = [Cell::new(7, 10), Cell::new(3, 17), Cell::new(8, 17), Cell::new(1, 1)];
    let mut next_waypoint = 0;

    for _ in 0..steps {
        let report = sim.step()?;
        for line in report.script.narration() {
            println!("[{:>4}] {}", sim.clock(), line);
        }
        if sim.is_party_dead() {
            break;
        }
        if !report.awaiting_input {
            continue;
        }

        let Some(actor) = sim.whose_turn() else {
            continue;
        };
        match (sim.mode(), nearest_monster(sim, actor)) {
            (Mode::Combat, Some(target)) => {
                if let Err(err) = sim.set_goal(target) {
                    warn!("{}", err);
                    sim.skip_turn(actor)?;
                }
            }
            (Mode::Combat, None) => {
                if let Err(WarbandError::Mode(reason)) = sim.request_exploration() {
                    warn!("{}", reason);
                    sim.skip_turn(actor)?;
                }
            }
            (Mode::Exploration, _) => {
                let Some(&waypoint) = waypoints.get(next_waypoint) else {
                    break;
                };
                next_waypoint += 1;
                if let Err(err) = sim.set_goal(waypoint) {
                    warn!("{}", err);
                }
            }
        }
    }

    let stats = &sim.statistics;
    println!(
        "Finished at tick {}: {} steps, {} damage, {} deaths, {} experience, {} alerts, {} rounds.",
        sim.clock(),
        stats.steps_taken,
        stats.damage_dealt,
        stats.deaths,
        stats.experience_awarded,
        stats.alerts_raised,
        stats.combat_rounds
    );
    Ok(())
}

/// The cell of the closest living monster to `actor`.
fn nearest_monster(sim: &Simulation, actor: MobileId) -> Option<Cell> {
    let here = sim.region.mobile(actor)?.cell;
    sim.region
        .mobiles()
        .filter(|m| m.is_monster() && m.is_alive())
        .map(|m| m.cell)
        .min_by_key(|cell| cell.diagonal_distance(here))
}
