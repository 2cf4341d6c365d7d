use npc_core::{FactSet, TickContext, WorldMut, WorldView};
use npc_htn::{
    Agent, AgentConfig, Coordinator, CoordinatorConfig, Directive, FnCompound, FnOperator,
    FnPrimitive, Method, Operator, OperatorStatus, PlanOutcome, PlanStatus, RootTask, RootTaskId,
    Task,
};

const STARVE: RootTaskId = RootTaskId("starve");
const IDLE: RootTaskId = RootTaskId("idle");

struct Camp;

impl WorldView for Camp {
    type Entity = u64;
}

impl WorldMut for Camp {}

fn impossible() -> Task<Camp> {
    FnCompound::new("Impossible", |_| {
        vec![Method::new("never")
            .when(|_| false)
            .then(
                FnPrimitive::new("Nothing", || -> Box<dyn Operator<Camp>> {
                    Box::new(FnOperator::<Camp>::new(|_, _, _| OperatorStatus::Success))
                })
                .into_task(),
            )]
    })
    .into_task()
}

fn loiter() -> Task<Camp> {
    FnPrimitive::new("Loiter", || -> Box<dyn Operator<Camp>> {
        Box::new(FnOperator::<Camp>::new(|_, _, _| OperatorStatus::Continuing))
    })
    .into_task()
}

fn agent() -> Agent<Camp> {
    let mut agent = Agent::new(4, FactSet::new()).with_config(AgentConfig {
        planning_cooldown_seconds: 0.1,
        ..AgentConfig::default()
    });
    agent.add_root_task(10, RootTask::new(STARVE, impossible));
    agent.add_root_task(5, RootTask::new(IDLE, loiter));
    agent
}

fn status(root: RootTaskId, outcome: PlanOutcome) -> PlanStatus<u64> {
    PlanStatus {
        entity: 4,
        root,
        outcome,
    }
}

#[test]
fn repeated_failures_deprioritize_the_root() {
    let mut agent = agent();
    let mut coordinator = Coordinator::default();
    let failed = status(STARVE, PlanOutcome::PlanningFailed);

    assert_eq!(coordinator.observe(&mut agent, &failed), None);
    assert_eq!(coordinator.observe(&mut agent, &failed), None);
    assert_eq!(coordinator.strikes(4u64, STARVE), 2);

    let directive = coordinator.observe(&mut agent, &failed);
    assert_eq!(
        directive,
        Some(Directive::Deprioritized {
            root: STARVE,
            priority: 0
        })
    );
    assert_eq!(agent.root_priority(STARVE), Some(0));
    assert_eq!(coordinator.strikes(4u64, STARVE), 0);
}

#[test]
fn success_clears_strikes() {
    let mut agent = agent();
    let mut coordinator = Coordinator::default();

    coordinator.observe(&mut agent, &status(IDLE, PlanOutcome::PlanAborted));
    coordinator.observe(&mut agent, &status(IDLE, PlanOutcome::PlanAborted));
    coordinator.observe(&mut agent, &status(IDLE, PlanOutcome::Success));
    coordinator.observe(&mut agent, &status(IDLE, PlanOutcome::PlanAborted));

    assert_eq!(coordinator.strikes(4u64, IDLE), 1);
    assert_eq!(agent.root_priority(IDLE), Some(5));
}

#[test]
fn retire_on_success_removes_the_root() {
    let mut agent = agent();
    let mut coordinator = Coordinator::new(CoordinatorConfig {
        retire_on_success: true,
        ..CoordinatorConfig::default()
    });

    let directives = coordinator.observe_all(
        &mut agent,
        &[
            status(IDLE, PlanOutcome::Continuing),
            status(IDLE, PlanOutcome::Success),
        ],
    );

    assert_eq!(directives, vec![Directive::Retired { root: IDLE }]);
    assert_eq!(agent.root_priority(IDLE), None);
}

#[test]
fn failing_root_yields_to_the_next_one() {
    let mut agent = agent();
    let mut coordinator = Coordinator::default();
    let mut outcomes = Vec::new();

    for tick in 0..4 {
        let ctx = TickContext::new(tick, 0.5, 1);
        let statuses = agent.update(&ctx, &mut Camp).expect("update");
        coordinator.observe_all(&mut agent, &statuses);
        outcomes.extend(statuses.into_iter().map(|s| (s.root, s.outcome)));
    }

    assert_eq!(
        outcomes,
        vec![
            (STARVE, PlanOutcome::PlanningFailed),
            (STARVE, PlanOutcome::PlanningFailed),
            (STARVE, PlanOutcome::PlanningFailed),
            (IDLE, PlanOutcome::Continuing),
        ]
    );
    assert_eq!(agent.current_root(), Some(IDLE));
}

#[test]
fn forget_drops_an_agents_strikes() {
    let mut agent = agent();
    let mut coordinator = Coordinator::default();
    coordinator.observe(&mut agent, &status(STARVE, PlanOutcome::PlanningFailed));

    coordinator.forget(4u64);

    assert_eq!(coordinator.strikes(4u64, STARVE), 0);
}
