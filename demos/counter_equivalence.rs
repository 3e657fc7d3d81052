//! Example: check that two counter implementations agree.
//!
//! This example demonstrates how to:
//! 1. Wrap two implementations with different internal representations
//! 2. Explore their synchronized product under a custom equivalence
//! 3. Encode the result and evaluate reachability properties on it
//!
//! Run with: cargo run --example counter_equivalence

use ctl_connect::*;
use std::collections::BTreeSet;

const MAX: u32 = 3;

/// The reference implementation: a plain integer.
#[derive(Default)]
struct Counter {
    value: u32,
}

/// The implementation under test: one entry per increment.
#[derive(Default)]
struct TallyCounter {
    ticks: Vec<()>,
}

/// "Some state where `label` was just observed is reachable" (EF label).
struct Reachability;

impl<S> CtlEngine<S> for Reachability {
    type Formula = String;
    type Error = String;

    fn check(&self, kripke: &Kripke<S>, label: &String) -> Result<BTreeSet<StateId>, String> {
        let mut reached = kripke.select(|id, _| kripke.holds(id, label));
        let mut frontier: Vec<StateId> = reached.iter().copied().collect();
        while let Some(id) = frontier.pop() {
            for pred in kripke.predecessors(id) {
                if reached.insert(pred) {
                    frontier.push(pred);
                }
            }
        }
        Ok(reached)
    }
}

fn reference() -> ConnectResult<ImplAdapter<Counter, u32>> {
    Ok(ImplAdapter::<Counter, u32>::builder()
        .factory(Counter::default)
        .snapshot(|c: &Counter| Ok(c.value))
        .restore(|c: &mut Counter, v: &u32| {
            c.value = *v;
            Ok(())
        })
        .action(
            ActionSpec::new("increment", |c: &mut Counter, _| {
                c.value += 1;
                Ok(())
            })
            .label("inc")
            .guard(|c: &Counter, _| c.value < MAX),
        )
        .action(
            ActionSpec::new("reset", |c: &mut Counter, _| {
                c.value = 0;
                Ok(())
            })
            .guard(|c: &Counter, _| c.value == MAX),
        )
        .build()?)
}

fn tally() -> ConnectResult<ImplAdapter<TallyCounter, usize>> {
    Ok(ImplAdapter::<TallyCounter, usize>::builder()
        .factory(TallyCounter::default)
        .snapshot(|c: &TallyCounter| Ok(c.ticks.len()))
        .restore(|c: &mut TallyCounter, n: &usize| {
            c.ticks = vec![(); *n];
            Ok(())
        })
        .action(
            ActionSpec::new("tick", |c: &mut TallyCounter, _| {
                c.ticks.push(());
                Ok(())
            })
            .label("inc")
            .guard(|c: &TallyCounter, _| c.ticks.len() < MAX as usize),
        )
        .action(
            ActionSpec::new("clear", |c: &mut TallyCounter, _| {
                c.ticks.clear();
                Ok(())
            })
            .label("reset")
            .guard(|c: &TallyCounter, _| c.ticks.len() == MAX as usize),
        )
        .build()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let left = reference()?;
    let right = tally()?;

    let same_count =
        |a: &StateSnapshot<u32>, b: &StateSnapshot<usize>| *a.data() as usize == *b.data();
    let model = StateGraphBuilder::new().build_joint_with(&left, &right, same_count)?;
    println!(
        "Joint model: {} states, {} transitions",
        model.state_count(),
        model.transition_count()
    );

    let checker = ModelChecker::from_model(&model, Reachability)?;
    println!("{}", serde_json::to_string_pretty(&checker.kripke().to_json()?)?);

    let suite = PropertySuite::new()
        .with_liveness("CanIncrement", "inc".to_string())
        .with_liveness("CanReset", "reset".to_string());
    let report = checker.check(&suite)?;

    for result in &report.results {
        println!("{} [{}]: {}", result.name, result.kind, result.holds);
    }
    if !report.all_hold() {
        return Err("implementations disagree".into());
    }
    println!("Implementations agree!");

    Ok(())
}
