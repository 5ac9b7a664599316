//! Objective graph scenarios driven through the session facade.

use std::sync::Arc;

use story_core::testing::{assert_objective_active, StoryHarness};
use story_core::{
    Dialogue, Item, Npc, Objective, ObjectiveCondition, ObjectiveZone, StoryGraph, StoryWorld,
};

fn chain_graph() -> (StoryGraph, story_core::ZoneId, StoryWorld) {
    let mut world = StoryWorld::new();
    let zone = world.add_zone(ObjectiveZone::new());

    let mut graph = StoryGraph::new();
    let talk = graph.add(Objective::new(
        "Talk to Marla",
        ObjectiveCondition::TalkToNpc {
            npc_name: "Marla".to_string(),
        },
    ));
    let collect = graph.add(Objective::new(
        "Find the brass key",
        ObjectiveCondition::CollectItem {
            item_name: "Brass Key".to_string(),
        },
    ));
    let reach = graph.add(Objective::new(
        "Reach the docks",
        ObjectiveCondition::EnterZone { zone },
    ));
    let finale = graph.add(Objective::new("Confront him", ObjectiveCondition::Custom));
    graph.link(talk, collect);
    graph.link(collect, reach);
    graph.link(reach, finale);

    (graph, zone, world)
}

#[test]
fn objectives_advance_through_the_whole_chain() {
    let (graph, zone, world) = chain_graph();
    let mut harness = StoryHarness::with_graph(graph);
    *harness.session.world_mut() = world;

    let npc = harness.add_npc(Npc::new(
        "Marla",
        Arc::new(Dialogue::new("Marla").with_sentence("What?")),
    ));

    assert_objective_active(&harness, "Talk to Marla");
    assert!(harness.tick_times(3).is_empty());

    // Objective 1: talk.
    harness.talk_to(npc);
    harness.advance_times(1);
    let events = harness.tick_times(1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Talk to Marla");
    assert_objective_active(&harness, "Find the brass key");

    // Objective 2: collect (and consuming it later must not matter).
    harness.session.pick_up(Item::new("Brass Key"));
    harness.session.world_mut().inventory.remove_by_name("Brass Key");
    let events = harness.tick_times(1);
    assert_eq!(events[0].title, "Find the brass key");
    assert_objective_active(&harness, "Reach the docks");

    // Objective 3: zone latch.
    harness.session.objective_zone_entered(zone);
    let events = harness.tick_times(1);
    assert_eq!(events[0].title, "Reach the docks");
    assert_objective_active(&harness, "Confront him");

    // Objective 4: custom, never auto-completes.
    assert!(harness.tick_times(10).is_empty());
    let event = harness.session.complete_objective().expect("should fire");
    assert_eq!(event.title, "Confront him");
    assert!(harness.session.graph().is_exhausted());
    assert_eq!(harness.session.graph().active_title(), None);
}

#[test]
fn one_completion_per_tick_even_when_several_are_satisfied() {
    let mut world = StoryWorld::new();
    world.progress.talk_to_npc("Marla");
    world.progress.talk_to_npc("Watchman");

    let mut graph = StoryGraph::new();
    let first = graph.add(Objective::new(
        "Talk to Marla",
        ObjectiveCondition::TalkToNpc {
            npc_name: "Marla".to_string(),
        },
    ));
    let second = graph.add(Objective::new(
        "Talk to the watchman",
        ObjectiveCondition::TalkToNpc {
            npc_name: "Watchman".to_string(),
        },
    ));
    graph.link(first, second);

    let mut harness = StoryHarness::with_graph(graph);
    *harness.session.world_mut() = world;

    // Both conditions already hold, but completions land on separate ticks.
    let events = harness.tick_times(1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Talk to Marla");

    let events = harness.tick_times(1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Talk to the watchman");

    assert!(harness.session.graph().is_exhausted());
}

#[test]
fn zone_latch_survives_leaving_the_zone() {
    let mut world = StoryWorld::new();
    let zone = world.add_zone(ObjectiveZone::new());

    let mut graph = StoryGraph::new();
    graph.add(Objective::new(
        "Visit the cellar",
        ObjectiveCondition::EnterZone { zone },
    ));

    let mut harness = StoryHarness::with_graph(graph);
    *harness.session.world_mut() = world;

    harness.session.objective_zone_entered(zone);
    // There is no "exited" transition for objective zones; the latch holds.
    assert!(harness.session.world().zone(zone).unwrap().is_player_inside);

    let events = harness.tick_times(1);
    assert_eq!(events[0].title, "Visit the cellar");
    assert!(harness.session.world().zone(zone).unwrap().is_player_inside);
}

#[test]
fn dialogue_end_drives_talk_objectives() {
    // The objective completes off the name reported at dialogue end, which
    // is the dialogue's name, not the NPC's display name.
    let mut graph = StoryGraph::new();
    graph.add(Objective::new(
        "Hear the confession",
        ObjectiveCondition::TalkToNpc {
            npc_name: "Confession".to_string(),
        },
    ));

    let mut harness = StoryHarness::with_graph(graph);
    let npc = harness.add_npc(Npc::new(
        "Father Bell",
        Arc::new(Dialogue::new("Confession").with_sentence("Forgive me.")),
    ));

    harness.talk_to(npc);
    assert!(harness.tick_times(1).is_empty());

    harness.advance_times(1);
    let events = harness.tick_times(1);
    assert_eq!(events[0].title, "Hear the confession");
}
