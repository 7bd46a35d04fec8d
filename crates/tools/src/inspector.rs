use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tileworld_common::{EntityId, Rect};
use tileworld_engine::{Clock, Engine};
use tileworld_kernel::World;

/// Read-only views of a world for debugging and the CLI.
pub struct WorldInspector;

impl WorldInspector {
    pub fn summary(world: &World) -> WorldSummary {
        let mut kinds = BTreeMap::new();
        let mut out_of_bounds = 0;
        for (id, entity) in world.entities() {
            *kinds.entry(entity.kind().name()).or_insert(0) += 1;
            if world.is_out_of_bounds(id).unwrap_or(false) {
                out_of_bounds += 1;
            }
        }
        let pending_input = world.input().map(|b| {
            let p = b.pending();
            p.keys + p.pointers + p.windows
        });
        WorldSummary {
            world: world.id().to_string(),
            tick: world.tick(),
            size: [world.width(), world.height()],
            cell_size: world.cell_size(),
            hard_edge: world.hard_edge(),
            entity_count: world.entity_count(),
            out_of_bounds,
            kinds,
            pending_input,
        }
    }

    pub fn inspect_entity(world: &World, id: EntityId) -> Option<EntityInfo> {
        let entity = world.entity(id).ok()?;
        let bounds = world.shape_of(id).ok()?.bounds();
        Some(EntityInfo {
            id,
            kinds: entity.kinds().iter().map(|t| t.name()).collect(),
            capabilities: entity.capabilities().iter().map(|t| t.name()).collect(),
            cell: [entity.x(), entity.y()],
            rotation: entity.rotation(),
            bounds,
            touching: world.touching(id, None).map(|t| t.len()).unwrap_or(0),
            at_edge: world.is_at_edge(id).unwrap_or(false),
            out_of_bounds: world.is_out_of_bounds(id).unwrap_or(false),
        })
    }

    pub fn list_entities(world: &World) -> Vec<EntityId> {
        world.objects()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub world: String,
    pub tick: u64,
    pub size: [i32; 2],
    pub cell_size: i32,
    pub hard_edge: bool,
    pub entity_count: usize,
    pub out_of_bounds: usize,
    /// Entity count per primary kind.
    pub kinds: BTreeMap<&'static str, usize>,
    /// Events waiting in the attached bridge, if one is attached.
    pub pending_input: Option<usize>,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World {}: tick={} size={}x{} cell={} hard_edge={} entities={} out_of_bounds={}",
            self.world,
            self.tick,
            self.size[0],
            self.size[1],
            self.cell_size,
            self.hard_edge,
            self.entity_count,
            self.out_of_bounds
        )?;
        for (kind, count) in &self.kinds {
            write!(f, "\n  {kind}: {count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kinds: Vec<&'static str>,
    pub capabilities: Vec<&'static str>,
    pub cell: [i32; 2],
    pub rotation: i32,
    pub bounds: Rect,
    pub touching: usize,
    pub at_edge: bool,
    pub out_of_bounds: bool,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity [{}] {} cell=({}, {}) rot={} touching={}",
            self.id,
            self.kinds.join("/"),
            self.cell[0],
            self.cell[1],
            self.rotation,
            self.touching
        )?;
        if !self.capabilities.is_empty() {
            write!(f, " caps={}", self.capabilities.join(","))?;
        }
        Ok(())
    }
}

/// Scheduler state and cycle timing.
pub struct EngineInspector;

impl EngineInspector {
    pub fn summary<C: Clock>(engine: &Engine<C>) -> EngineSummary {
        let stats = engine.stats();
        let tickables = engine.tickables();
        EngineSummary {
            ticks_per_second: engine.ticks_per_second(),
            running: engine.is_running(),
            cycles: stats.cycles(),
            overruns: stats.overruns(),
            average_cycle: stats.average(),
            max_cycle: stats.max(),
            worlds: tickables.iter().filter(|t| t.is_world).count(),
            tickables: tickables.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSummary {
    pub ticks_per_second: f64,
    pub running: bool,
    pub cycles: u64,
    pub overruns: u64,
    pub average_cycle: Duration,
    pub max_cycle: Duration,
    pub worlds: usize,
    pub tickables: Vec<String>,
}

impl fmt::Display for EngineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine: {} tps running={} cycles={} overruns={} avg={:?} max={:?} worlds={}",
            self.ticks_per_second,
            self.running,
            self.cycles,
            self.overruns,
            self.average_cycle,
            self.max_cycle,
            self.worlds
        )
    }
}
