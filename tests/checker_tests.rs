//! Tests for property checking through a pluggable engine.

use ctl_connect::*;
use std::collections::BTreeSet;

/// Small CTL fragment, enough to exercise the checker.
#[derive(Debug, Clone)]
enum Ctl {
    True,
    Atom(&'static str),
    Not(Box<Ctl>),
    And(Box<Ctl>, Box<Ctl>),
    Ex(Box<Ctl>),
    Ef(Box<Ctl>),
    Ag(Box<Ctl>),
}

fn not(f: Ctl) -> Ctl {
    Ctl::Not(Box::new(f))
}

fn ex(f: Ctl) -> Ctl {
    Ctl::Ex(Box::new(f))
}

fn ef(f: Ctl) -> Ctl {
    Ctl::Ef(Box::new(f))
}

fn ag(f: Ctl) -> Ctl {
    Ctl::Ag(Box::new(f))
}

fn and(a: Ctl, b: Ctl) -> Ctl {
    Ctl::And(Box::new(a), Box::new(b))
}

/// Fixpoint evaluation over the structure's edges.
struct Fixpoint;

impl Fixpoint {
    fn sat<S>(&self, k: &Kripke<S>, f: &Ctl) -> BTreeSet<StateId> {
        let all: BTreeSet<StateId> = (0..k.len()).collect();
        match f {
            Ctl::True => all,
            Ctl::Atom(p) => k.select(|id, _| k.holds(id, p)),
            Ctl::Not(g) => all.difference(&self.sat(k, g)).copied().collect(),
            Ctl::And(a, b) => self.sat(k, a).intersection(&self.sat(k, b)).copied().collect(),
            Ctl::Ex(g) => {
                let target = self.sat(k, g);
                k.select(|id, _| k.successors(id).any(|n| target.contains(&n)))
            }
            Ctl::Ef(g) => {
                let mut reached = self.sat(k, g);
                loop {
                    let more: BTreeSet<StateId> = reached
                        .iter()
                        .flat_map(|&id| k.predecessors(id))
                        .filter(|id| !reached.contains(id))
                        .collect();
                    if more.is_empty() {
                        return reached;
                    }
                    reached.extend(more);
                }
            }
            Ctl::Ag(g) => self.sat(k, &not(ef(not((**g).clone())))),
        }
    }
}

impl<S> CtlEngine<S> for Fixpoint {
    type Formula = Ctl;
    type Error = String;

    fn check(&self, kripke: &Kripke<S>, formula: &Ctl) -> Result<BTreeSet<StateId>, String> {
        Ok(self.sat(kripke, formula))
    }
}

/// Engine that fails on every formula.
struct Unavailable;

impl<S> CtlEngine<S> for Unavailable {
    type Formula = Ctl;
    type Error = String;

    fn check(&self, _: &Kripke<S>, _: &Ctl) -> Result<BTreeSet<StateId>, String> {
        Err("solver offline".to_string())
    }
}

/// Engine that reports a state the structure does not have.
struct OutOfRange;

impl<S> CtlEngine<S> for OutOfRange {
    type Formula = Ctl;
    type Error = String;

    fn check(&self, kripke: &Kripke<S>, _: &Ctl) -> Result<BTreeSet<StateId>, String> {
        Ok([kripke.len() + 3].into())
    }
}

#[derive(Default)]
struct Counter {
    value: u32,
}

fn counter(max: u32) -> ImplAdapter<Counter, u32> {
    ImplAdapter::<Counter, u32>::builder()
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
            .guard(move |c: &Counter, _| c.value < max),
        )
        .action(
            ActionSpec::new("decrement", |c: &mut Counter, _| {
                c.value -= 1;
                Ok(())
            })
            .label("dec")
            .guard(|c: &Counter, _| c.value > 0),
        )
        .build()
        .unwrap()
}

fn checker<E: CtlEngine<StateSnapshot<u32>>>(engine: E) -> ModelChecker<StateSnapshot<u32>, E> {
    let model = StateGraphBuilder::new().build(&counter(2)).unwrap();
    ModelChecker::from_model(&model, engine).unwrap()
}

#[test]
fn test_counter_suite_verdicts() {
    let checker = checker(Fixpoint);
    assert!(checker.kripke().is_total());

    let suite = PropertySuite::new()
        // The initial state is never entered by a transition.
        .with_safety("StartsUnlabeled", not(Ctl::Atom("inc")))
        .with_safety("NeverBothDirections", ag(not(and(Ctl::Atom("inc"), Ctl::Atom("dec")))))
        .with_safety("AlwaysIncremented", ag(Ctl::Atom("inc")))
        .with_liveness("CanIncrement", ef(Ctl::Atom("inc")))
        .with_liveness("CanStepDown", ef(ex(Ctl::Atom("dec"))));

    let report = checker.check(&suite).unwrap();
    assert_eq!(report.results.len(), 5);
    assert!(!report.all_hold());

    let verdicts = report.verdicts();
    assert!(verdicts["StartsUnlabeled"]);
    assert!(!verdicts["NeverBothDirections"]);
    assert!(!verdicts["AlwaysIncremented"]);
    assert!(verdicts["CanIncrement"]);
    assert!(verdicts["CanStepDown"]);

    let failing: Vec<_> = report.failures().map(|r| r.name.as_str()).collect();
    assert_eq!(failing, vec!["NeverBothDirections", "AlwaysIncremented"]);

    let result = report.get("AlwaysIncremented").unwrap();
    assert_eq!(result.kind, PropertyKind::Safety);
    assert_eq!(result.failing_initial, vec![0]);
    assert_eq!(report.get("CanIncrement").unwrap().kind, PropertyKind::Liveness);
}

#[test]
fn test_check_single_property() {
    let checker = checker(Fixpoint);
    let result = checker
        .check_property(PropertyKind::Liveness, "Anything", &Ctl::True)
        .unwrap();
    assert!(result.holds);
    assert!(result.failing_initial.is_empty());
    assert_eq!(result.name, "Anything");
}

#[test]
fn test_engine_error_names_property() {
    let checker = checker(Unavailable);
    let suite = PropertySuite::new().with_safety("Safe", Ctl::True);

    let err = checker.check(&suite).unwrap_err();
    match err {
        Error::Check(CheckError::Engine { property, reason }) => {
            assert_eq!(property, "Safe");
            assert_eq!(reason, "solver offline");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_out_of_range_state_is_rejected() {
    let checker = checker(OutOfRange);
    let err = checker
        .check_property(PropertyKind::Safety, "Bogus", &Ctl::True)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Check(CheckError::UnknownState { ref property, id: 6 }) if property == "Bogus"
    ));
}

#[test]
fn test_invalid_suite_is_rejected_before_checking() {
    let checker = checker(Unavailable);
    let suite = PropertySuite::new()
        .with_safety("Twice", Ctl::True)
        .with_liveness("Twice", Ctl::True);

    // Validation runs first, so the failing engine is never consulted.
    let err = checker.check(&suite).unwrap_err();
    assert!(matches!(err, Error::Property(PropertyError::DuplicateName(ref n)) if n == "Twice"));
}

#[test]
fn test_empty_structure_holds_vacuously() {
    let model: Model<u8> = Model::from_parts([], [], Default::default());
    let checker = ModelChecker::from_model(&model, Fixpoint).unwrap();

    let suite = PropertySuite::new().with_safety("Impossible", not(Ctl::True));
    let report = checker.check(&suite).unwrap();
    assert!(report.all_hold());
}

#[test]
fn test_joint_model_checks_agreement() {
    let left = counter(1);
    let right = counter(2);
    let model = StateGraphBuilder::new().build_joint(&left, &right).unwrap();
    let checker = ModelChecker::from_model(&model, Fixpoint).unwrap();

    let suite = PropertySuite::new()
        .with_liveness("JointIncrement", ef(Ctl::Atom("inc")))
        .with_safety("StepsBack", ag(ex(Ctl::True)));
    let report = checker.check(&suite).unwrap();
    assert!(report.all_hold(), "{report:?}");
}
