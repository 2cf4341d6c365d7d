use std::cell::Cell;
use std::rc::Rc;

use npc_core::{FactKey, FactSet, FnFact, TickContext, WorldMut, WorldView};
use npc_htn::{
    Agent, AgentConfig, AgentState, FnCompound, FnOperator, FnPrimitive, Method, Operator,
    OperatorStatus, PlanError, PlanOutcome, PlanStatus, RootTask, RootTaskId, Task,
};
use npc_tools::Tracer;

const EAT: RootTaskId = RootTaskId("eat");
const WAVE: RootTaskId = RootTaskId("wave");

const HOLDING: FactKey<bool> = FactKey::new("holding");
const FOOD_NEARBY: FactKey<bool> = FactKey::new("food_nearby");

#[derive(Default)]
struct Kitchen {
    food_nearby: bool,
    holding: bool,
    block_pickup: bool,
    eaten: u32,
    walked: u32,
    cancelled: Vec<&'static str>,
}

impl WorldView for Kitchen {
    type Entity = u64;
}

impl WorldMut for Kitchen {}

struct Walk {
    remaining: u32,
}

impl Operator<Kitchen> for Walk {
    fn execute(&mut self, _ctx: &TickContext, _entity: u64, world: &mut Kitchen) -> OperatorStatus {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return OperatorStatus::Continuing;
        }
        world.walked += 1;
        OperatorStatus::Success
    }

    fn cancel(&mut self, _ctx: &TickContext, _entity: u64, world: &mut Kitchen) {
        world.cancelled.push("walk");
    }
}

fn eat_food(walk_ticks: u32) -> Task<Kitchen> {
    let eat = || {
        FnPrimitive::new("Eat", || -> Box<dyn Operator<Kitchen>> {
            Box::new(FnOperator::<Kitchen>::new(|_, _, world: &mut Kitchen| {
                world.holding = false;
                world.eaten += 1;
                OperatorStatus::Success
            }))
        })
        .effect(|s| {
            s.update(HOLDING, false);
        })
        .into_task()
    };

    FnCompound::new("EatFood", move |_| {
        vec![
            Method::new("UseFoodInHand")
                .when(|s| s.flag(HOLDING))
                .then(eat()),
            Method::new("PickupNearestFood")
                .when(|s| s.flag(FOOD_NEARBY))
                .then(
                    FnPrimitive::new("Walk", move || -> Box<dyn Operator<Kitchen>> {
                        Box::new(Walk {
                            remaining: walk_ticks,
                        })
                    })
                    .into_task(),
                )
                .then(
                    FnPrimitive::new("Pickup", || -> Box<dyn Operator<Kitchen>> {
                        Box::new(FnOperator::<Kitchen>::new(|_, _, world: &mut Kitchen| {
                            if world.block_pickup {
                                return OperatorStatus::Failed;
                            }
                            world.food_nearby = false;
                            world.holding = true;
                            OperatorStatus::Success
                        }))
                    })
                    .effect(|s| {
                        s.update(HOLDING, true);
                    })
                    .into_task(),
                )
                .then(eat()),
        ]
    })
    .into_task()
}

fn facts() -> FactSet<Kitchen> {
    FactSet::new()
        .with(FnFact::new(HOLDING, |_, w: &Kitchen| w.holding))
        .with(FnFact::new(FOOD_NEARBY, |_, w: &Kitchen| w.food_nearby))
}

fn agent(walk_ticks: u32) -> Agent<Kitchen> {
    let mut agent = Agent::new(1, facts()).with_tracer(Tracer::new().with_log());
    agent.add_root_task(10, RootTask::new(EAT, move || eat_food(walk_ticks)));
    agent
}

fn tick(n: u64) -> TickContext {
    TickContext::new(n, 0.1, 7)
}

fn status(root: RootTaskId, outcome: PlanOutcome) -> PlanStatus<u64> {
    PlanStatus {
        entity: 1,
        root,
        outcome,
    }
}

#[test]
fn plans_on_first_update_and_runs_to_success() {
    let mut world = Kitchen {
        food_nearby: true,
        ..Kitchen::default()
    };
    let mut agent = agent(2);

    let events = agent.update(&tick(0), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
    assert_eq!(agent.state(), AgentState::Executing);
    let plan = agent.plan().expect("plan");
    assert_eq!(plan.step_names(), vec!["Walk", "Pickup", "Eat"]);
    assert_eq!(plan.route(), &[1]);

    assert!(agent.update(&tick(1), &mut world).expect("update").is_empty());
    assert_eq!(world.walked, 1);
    assert!(agent.update(&tick(2), &mut world).expect("update").is_empty());
    assert!(world.holding);

    let events = agent.update(&tick(3), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::Success)]);
    assert_eq!(world.eaten, 1);
    assert_eq!(agent.state(), AgentState::Exhausted);
    assert!(agent.plan().is_none());

    let log = agent.trace_log().expect("trace log");
    assert_eq!(log.count("htn.plan.start"), 1);
    assert_eq!(log.count("htn.step.success"), 3);
    assert_eq!(log.count("htn.plan.outcome.success"), 1);

    // Nothing left to eat: the fact change triggers an immediate, failing attempt.
    let events = agent.update(&tick(4), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::PlanningFailed)]);
    assert_eq!(agent.state(), AgentState::Idle);
}

#[test]
fn planning_failure_reports_and_stays_idle() {
    let mut world = Kitchen::default();
    let mut agent = agent(1);

    let events = agent.update(&tick(0), &mut world).expect("update");

    assert_eq!(events, vec![status(EAT, PlanOutcome::PlanningFailed)]);
    assert_eq!(agent.state(), AgentState::Idle);
    assert!(agent.plan().is_none());
    assert!(agent.trace_log().expect("trace log").contains("htn.plan.none"));
}

#[test]
fn fact_change_wakes_an_idle_agent_only_when_enabled() {
    for eager in [true, false] {
        let mut world = Kitchen::default();
        let mut agent = agent(1).with_config(AgentConfig {
            plan_on_fact_change: eager,
            ..AgentConfig::default()
        });

        let events = agent.update(&tick(0), &mut world).expect("update");
        assert_eq!(events, vec![status(EAT, PlanOutcome::PlanningFailed)]);

        world.food_nearby = true;
        let events = agent.update(&tick(1), &mut world).expect("update");
        if eager {
            assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
            assert_eq!(agent.state(), AgentState::Executing);
        } else {
            assert!(events.is_empty());
            assert_eq!(agent.state(), AgentState::Idle);
        }
    }
}

#[test]
fn operator_failure_drops_the_whole_plan() {
    let mut world = Kitchen {
        food_nearby: true,
        block_pickup: true,
        ..Kitchen::default()
    };
    let mut agent = agent(1);

    let events = agent.update(&tick(0), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
    assert_eq!(world.walked, 1);

    let events = agent.update(&tick(1), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::PlanAborted)]);
    assert_eq!(agent.state(), AgentState::Idle);
    assert!(agent.plan().is_none());

    // Cooldown still running and no fact changed: stays idle.
    for n in 2..5 {
        assert!(agent.update(&tick(n), &mut world).expect("update").is_empty());
        assert!(agent.plan().is_none());
    }

    // Next attempt starts over from the first step.
    world.block_pickup = false;
    let events = agent.update(&tick(5), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
    assert_eq!(world.walked, 2);
    assert_eq!(
        agent.plan().expect("plan").step_names(),
        vec!["Pickup", "Eat"]
    );
}

#[test]
fn removing_the_running_root_cancels_its_operator() {
    let mut world = Kitchen {
        food_nearby: true,
        ..Kitchen::default()
    };
    let mut agent = agent(10);

    agent.update(&tick(0), &mut world).expect("update");
    assert_eq!(agent.current_root(), Some(EAT));

    assert!(agent.remove_root_task(EAT));
    assert!(!agent.remove_root_task(EAT));
    let events = agent.update(&tick(1), &mut world).expect("update");

    assert_eq!(events, vec![status(EAT, PlanOutcome::PlanAborted)]);
    assert_eq!(world.cancelled, vec!["walk"]);
    assert_eq!(agent.state(), AgentState::Idle);
    assert!(agent.plan().is_none());
    assert!(agent.trace_log().expect("trace log").contains("htn.plan.abandoned"));
}

#[test]
fn replanning_swaps_only_for_a_better_route() {
    let mut world = Kitchen {
        food_nearby: true,
        ..Kitchen::default()
    };
    let mut agent = agent(100);

    agent.update(&tick(0), &mut world).expect("update");
    for n in 1..5 {
        agent.update(&tick(n), &mut world).expect("update");
    }

    // Cooldown elapses; same situation, same route: the running plan is kept.
    let events = agent.update(&tick(5), &mut world).expect("update");
    assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
    assert_eq!(agent.plan().expect("plan").route(), &[1]);
    assert_eq!(agent.trace_log().expect("trace log").count("htn.plan.kept"), 1);
    assert!(world.cancelled.is_empty());

    // Food appears in hand: the next replan finds an earlier method and takes over.
    world.holding = true;
    for n in 6..10 {
        assert!(agent.update(&tick(n), &mut world).expect("update").is_empty());
    }
    // The new head runs in the same tick and finishes the plan.
    let events = agent.update(&tick(10), &mut world).expect("update");
    assert_eq!(
        events,
        vec![
            status(EAT, PlanOutcome::Continuing),
            status(EAT, PlanOutcome::Success)
        ]
    );
    assert_eq!(world.cancelled, vec!["walk"]);
    assert_eq!(agent.trace_log().expect("trace log").count("htn.plan.replace"), 1);
    assert!(agent.plan().is_none());
    assert_eq!(world.eaten, 1);
    assert_eq!(agent.state(), AgentState::Exhausted);
}

#[test]
fn higher_priority_root_aborts_the_running_plan() {
    let mut world = Kitchen {
        food_nearby: true,
        ..Kitchen::default()
    };
    let mut agent = agent(100);
    agent.update(&tick(0), &mut world).expect("update");
    assert_eq!(agent.current_root(), Some(EAT));

    agent.add_root_task(
        50,
        RootTask::new(WAVE, || {
            FnPrimitive::new("Wave", || -> Box<dyn Operator<Kitchen>> {
                Box::new(FnOperator::<Kitchen>::new(|_, _, _| OperatorStatus::Continuing))
            })
            .into_task()
        }),
    );
    let events = agent.update(&tick(1), &mut world).expect("update");

    assert_eq!(
        events,
        vec![
            status(EAT, PlanOutcome::PlanAborted),
            status(WAVE, PlanOutcome::Continuing)
        ]
    );
    assert_eq!(world.cancelled, vec!["walk"]);
    assert_eq!(agent.current_root(), Some(WAVE));
}

#[test]
fn failed_replan_keeps_the_running_plan() {
    let mut world = Kitchen {
        food_nearby: true,
        ..Kitchen::default()
    };
    let mut agent = agent(100);
    agent.update(&tick(0), &mut world).expect("update");

    // The food vanishes mid-walk; the replan finds nothing but the walk goes on.
    world.food_nearby = false;
    for n in 1..5 {
        assert!(agent.update(&tick(n), &mut world).expect("update").is_empty());
    }
    let events = agent.update(&tick(5), &mut world).expect("update");

    assert_eq!(events, vec![status(EAT, PlanOutcome::Continuing)]);
    assert_eq!(agent.state(), AgentState::Executing);
    assert_eq!(agent.plan().expect("plan").step_names(), vec!["Walk", "Pickup", "Eat"]);
    assert!(world.cancelled.is_empty());
    assert_eq!(agent.trace_log().expect("trace log").count("htn.plan.none"), 1);
}

#[test]
fn highest_priority_root_is_selected() {
    let mut agent = agent(1);
    agent.add_root_task(
        10,
        RootTask::new(WAVE, || {
            FnPrimitive::new("Wave", || -> Box<dyn Operator<Kitchen>> {
                Box::new(FnOperator::<Kitchen>::new(|_, _, _| OperatorStatus::Success))
            })
            .into_task()
        }),
    );

    // Equal priority: the earlier root wins.
    assert_eq!(agent.selected_root(), Some(EAT));

    assert!(agent.set_root_priority(WAVE, 11));
    assert_eq!(agent.selected_root(), Some(WAVE));
    assert_eq!(agent.root_priority(WAVE), Some(11));

    // Re-adding replaces the entry in place.
    agent.add_root_task(20, RootTask::new(EAT, || eat_food(1)));
    assert_eq!(agent.root_tasks().count(), 2);
    assert_eq!(agent.selected_root(), Some(EAT));

    assert!(!agent.set_root_priority(RootTaskId("sleep"), 1));
    assert_eq!(agent.root_priority(RootTaskId("sleep")), None);
}

#[test]
fn throttled_operator_respects_interval() {
    let runs = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&runs);
    let mut agent = Agent::new(1, facts()).with_config(AgentConfig {
        operator_interval_seconds: 0.5,
        ..AgentConfig::default()
    });
    agent.add_root_task(
        1,
        RootTask::new(WAVE, move || {
            let counter = Rc::clone(&counter);
            FnCompound::new("Greet", move |_| {
                let counter = Rc::clone(&counter);
                vec![Method::new("wave").then(
                    FnPrimitive::new("Wave", move || -> Box<dyn Operator<Kitchen>> {
                        let counter = Rc::clone(&counter);
                        Box::new(
                            FnOperator::<Kitchen>::new(move |_, _, _| {
                                counter.set(counter.get() + 1);
                                OperatorStatus::Continuing
                            })
                            .throttled(),
                        )
                    })
                    .into_task(),
                )]
            })
            .into_task()
        }),
    );

    let mut world = Kitchen::default();
    for n in 0..5 {
        agent
            .update(&TickContext::new(n, 0.25, 7), &mut world)
            .expect("update");
    }

    assert_eq!(runs.get(), 3);
}

#[test]
fn malformed_root_surfaces_as_error() {
    let mut agent = Agent::new(1, facts());
    agent.add_root_task(
        1,
        RootTask::new(EAT, || {
            FnCompound::<Kitchen>::new("Hollow", |_| Vec::new()).into_task()
        }),
    );

    let err = agent
        .update(&tick(0), &mut Kitchen::default())
        .expect_err("malformed");

    assert!(matches!(err, PlanError::NoMethods { .. }));
    assert_eq!(agent.state(), AgentState::Idle);
}
