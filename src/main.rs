//! Headless skirmish: an avatar and its minions against scattered hostile packs.
//!
//! Usage: `skirmish [config.toml]`. Log verbosity follows `RUST_LOG`.

use std::process::ExitCode;
use std::time::Duration;

use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use skirmish::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Simulated frame length.
const FRAME: Duration = Duration::from_millis(33);

/// Frames before the demo stops, about two minutes of simulated time.
const MAX_FRAMES: usize = 3_600;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish=info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match CombatConfig::load(&path) {
            Ok(config) => {
                info!(%path, "loaded combat config");
                config
            }
            Err(err) => {
                error!(%path, %err, "could not load combat config");
                return ExitCode::FAILURE;
            }
        },
        None => CombatConfig::default(),
    };

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, CombatPlugin { config }))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .add_systems(Startup, setup_skirmish)
        .add_systems(Update, command_avatar.before(GameSet::Behavior));

    let mut frames = 0;
    while frames < MAX_FRAMES {
        app.update();
        frames += 1;
        if frames > 1 && is_decided(app.world_mut()) {
            break;
        }
    }

    report(app.world_mut(), frames);
    ExitCode::SUCCESS
}

fn setup_skirmish(
    mut commands: Commands,
    config: Res<CombatConfig>,
    catalog: Res<AbilityCatalog>,
    mut packs: MessageWriter<SpawnPack>,
) {
    let avatar = spawn_unit(
        &mut commands,
        UnitKind::Avatar,
        Team::Player,
        Vec2::new(-150.0, 0.0),
        &config,
        &catalog,
    );
    commands.insert_resource(DemoAvatar(avatar));

    packs.write_batch([
        SpawnPack::new(UnitKind::Minion, 4, Vec2::new(-180.0, 0.0), 40.0),
        SpawnPack::new(UnitKind::Grunt, 3, Vec2::new(120.0, 60.0), 40.0),
        SpawnPack::new(UnitKind::Archer, 2, Vec2::new(180.0, -40.0), 30.0),
        SpawnPack::new(UnitKind::Shaman, 1, Vec2::new(200.0, 0.0), 10.0),
    ]);
}

/// Plays the player: whenever the avatar is idle, order it onto the nearest enemy.
fn command_avatar(
    avatar: Option<Res<DemoAvatar>>,
    allies: Query<(&AllyBehavior, &Transform)>,
    units: Query<(Entity, &Team, &Transform), With<UnitKind>>,
    mut orders: MessageWriter<UnitCommand>,
) {
    let Some(avatar) = avatar else {
        return;
    };
    let Ok((behavior, transform)) = allies.get(avatar.0) else {
        return;
    };
    if behavior.state() != AllyState::Idle {
        return;
    }
    let position = transform.translation.xy();
    let nearest = units
        .iter()
        .filter(|(_, team, _)| **team == Team::Enemy)
        .min_by(|a, b| {
            let da = a.2.translation.xy().distance(position);
            let db = b.2.translation.xy().distance(position);
            da.total_cmp(&db)
        });
    if let Some((enemy, ..)) = nearest {
        orders.write(UnitCommand {
            unit: avatar.0,
            order: Order::Attack(enemy),
        });
    }
}

#[derive(Resource)]
struct DemoAvatar(Entity);

/// One side has no units left.
fn is_decided(world: &mut World) -> bool {
    let (players, enemies) = head_count(world);
    players == 0 || enemies == 0
}

fn head_count(world: &mut World) -> (usize, usize) {
    let mut teams = world.query_filtered::<&Team, With<UnitKind>>();
    teams
        .iter(world)
        .fold((0, 0), |(players, enemies), team| match team {
            Team::Player => (players + 1, enemies),
            Team::Enemy => (players, enemies + 1),
        })
}

fn report(world: &mut World, frames: usize) {
    let (players, enemies) = head_count(world);
    let elapsed = FRAME * u32::try_from(frames).unwrap_or(u32::MAX);
    let outcome = match (players, enemies) {
        (_, 0) => "victory",
        (0, _) => "defeat",
        _ => "undecided",
    };
    let avatar = world.get_resource::<DemoAvatar>().map(|avatar| avatar.0);
    let avatar_xp = avatar
        .and_then(|avatar| world.get::<Experience>(avatar))
        .map(|experience| experience.0);
    info!(
        outcome,
        frames,
        seconds = elapsed.as_secs_f32(),
        players,
        enemies,
        ?avatar_xp,
        "skirmish finished"
    );
}
