//! Objective graph driver.
//!
//! Objectives form an authored forest with linear advancement: each node may
//! list several successors, but only the first is ever advanced to, so each
//! branch behaves as a linked list. Exactly one objective is active at a
//! time. Conditions are evaluated against the world on each tick; explicit
//! completion covers `Custom` and `None` conditions.
//!
//! State machine per objective: Pending → Active → Completed. Completion
//! fires at most once per objective.

use serde::{Deserialize, Serialize};

use crate::world::{StoryWorld, ZoneId};

/// Handle to an objective within a [`StoryGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectiveId(usize);

/// How an objective auto-completes, if at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveCondition {
    /// Never auto-completes; use explicit completion.
    None,
    /// Completes once the player has talked to the named NPC.
    TalkToNpc { npc_name: String },
    /// Completes once the named item has *ever* been collected.
    ///
    /// This reads the progress tracker, not the inventory: an item consumed
    /// after pickup still satisfies the objective.
    CollectItem { item_name: String },
    /// Completes once the zone's latch is set.
    EnterZone { zone: ZoneId },
    /// Completed only by game-specific code calling
    /// [`StoryGraph::complete_active`].
    Custom,
}

/// One quest step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub title: String,
    pub condition: ObjectiveCondition,
    pub is_completed: bool,
    pub is_active: bool,
    /// Successors; only `next[0]` is ever advanced to.
    pub next: Vec<ObjectiveId>,
}

impl Objective {
    pub fn new(title: impl Into<String>, condition: ObjectiveCondition) -> Self {
        Self {
            title: title.into(),
            condition,
            is_completed: false,
            is_active: false,
            next: Vec::new(),
        }
    }
}

/// Fired when an objective completes. Returned to the caller, which
/// broadcasts to whatever listeners it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveCompleted {
    pub id: ObjectiveId,
    pub title: String,
}

/// A trigger zone referenced by `EnterZone` objectives.
///
/// `is_player_inside` is a one-way latch: entering sets it, nothing clears
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveZone {
    id: ZoneId,
    pub is_player_inside: bool,
}

impl ObjectiveZone {
    pub fn new() -> Self {
        Self {
            id: ZoneId::new(),
            is_player_inside: false,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn player_entered(&mut self) {
        self.is_player_inside = true;
    }
}

impl Default for ObjectiveZone {
    fn default() -> Self {
        Self::new()
    }
}

/// The authored objective forest and its single active pointer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryGraph {
    objectives: Vec<Objective>,
    active: Option<ObjectiveId>,
    started: bool,
}

impl StoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an objective. The first objective added becomes active on
    /// [`start`](Self::start).
    pub fn add(&mut self, objective: Objective) -> ObjectiveId {
        self.objectives.push(objective);
        ObjectiveId(self.objectives.len() - 1)
    }

    /// Make `to` a successor of `from`.
    pub fn link(&mut self, from: ObjectiveId, to: ObjectiveId) {
        match self.objectives.get_mut(from.0) {
            Some(objective) => objective.next.push(to),
            None => tracing::warn!(?from, "link from unknown objective"),
        }
    }

    /// Activate the first authored objective. Idempotent; a no-op on an
    /// empty graph.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if !self.objectives.is_empty() {
            let first = ObjectiveId(0);
            self.objectives[0].is_active = true;
            self.active = Some(first);
            tracing::info!(objective = %self.objectives[0].title, "objective active");
        }
    }

    /// Evaluate the active objective's condition against the world and
    /// complete it if satisfied. At most one completion per tick.
    pub fn tick(&mut self, world: &StoryWorld) -> Option<ObjectiveCompleted> {
        let id = self.active?;
        let objective = &self.objectives[id.0];
        if objective.is_completed || !condition_met(&objective.condition, world) {
            return None;
        }
        self.complete(id)
    }

    /// Complete the active objective regardless of its condition.
    pub fn complete_active(&mut self) -> Option<ObjectiveCompleted> {
        self.active.and_then(|id| self.complete(id))
    }

    /// Complete an objective by id. Idempotent: an already-completed
    /// objective never re-fires its event. If the objective is the active
    /// one, the active pointer advances to its first successor.
    pub fn complete(&mut self, id: ObjectiveId) -> Option<ObjectiveCompleted> {
        let Some(objective) = self.objectives.get_mut(id.0) else {
            tracing::warn!(?id, "complete on unknown objective");
            return None;
        };
        if objective.is_completed {
            return None;
        }
        objective.is_completed = true;
        objective.is_active = false;
        let event = ObjectiveCompleted {
            id,
            title: objective.title.clone(),
        };
        tracing::info!(objective = %event.title, "objective completed");

        if self.active == Some(id) {
            self.active = self.objectives[id.0].next.first().copied();
            match self.active {
                Some(next) => {
                    self.objectives[next.0].is_active = true;
                    tracing::info!(objective = %self.objectives[next.0].title, "objective active");
                }
                None => tracing::info!("all objectives completed"),
            }
        }

        Some(event)
    }

    pub fn active_id(&self) -> Option<ObjectiveId> {
        self.active
    }

    pub fn active(&self) -> Option<&Objective> {
        self.active.map(|id| &self.objectives[id.0])
    }

    /// Title of the active objective, for HUD text.
    pub fn active_title(&self) -> Option<&str> {
        self.active().map(|o| o.title.as_str())
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.get(id.0)
    }

    /// Whether the graph was started and has run out of objectives.
    pub fn is_exhausted(&self) -> bool {
        self.started && self.active.is_none()
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }
}

fn condition_met(condition: &ObjectiveCondition, world: &StoryWorld) -> bool {
    match condition {
        ObjectiveCondition::None | ObjectiveCondition::Custom => false,
        ObjectiveCondition::TalkToNpc { npc_name } => world.progress.has_talked_to(npc_name),
        ObjectiveCondition::CollectItem { item_name } => world.progress.has_item(item_name),
        ObjectiveCondition::EnterZone { zone } => world
            .zone(*zone)
            .map(|z| z.is_player_inside)
            .unwrap_or(false),
    }
}
