//! ExperimentBuilder Tests
//!
//! Declaration semantics independent of any runner: last-write-wins,
//! ignore set membership, build failures and snapshot isolation.

use futures::FutureExt;
use proptest::prelude::*;
use scientist_core::prelude::*;
use scientist_core::PredicateId;

#[derive(Debug, Clone, Copy)]
enum Declaration {
    Control(i64),
    Candidate(i64),
    Gate(bool),
    Compare(bool),
    Hook(bool),
}

fn declaration() -> impl Strategy<Value = Declaration> {
    prop_oneof![
        any::<i64>().prop_map(Declaration::Control),
        any::<i64>().prop_map(Declaration::Candidate),
        any::<bool>().prop_map(Declaration::Gate),
        any::<bool>().prop_map(Declaration::Compare),
        any::<bool>().prop_map(Declaration::Hook),
    ]
}

fn apply(builder: &mut ExperimentBuilder<i64>, declaration: Declaration) {
    match declaration {
        Declaration::Control(v) => {
            builder.control(move || v);
        }
        Declaration::Candidate(v) => {
            builder.candidate_async(move || async move { v });
        }
        Declaration::Gate(open) => {
            builder.run_if(move || open);
        }
        Declaration::Compare(answer) => {
            builder.compare(move |_, _| answer);
        }
        Declaration::Hook(ok) => {
            builder.before_run(move || {
                if ok {
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("hook rejected"))
                }
            });
        }
    }
}

#[test]
fn build_without_behaviors_fails() {
    let builder = ExperimentBuilder::<i64>::new("empty").unwrap();
    let err = builder.build().unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("empty"));
}

#[test]
fn build_is_repeatable() {
    let mut builder = ExperimentBuilder::<i64>::new("repeat").unwrap();
    builder.control(|| 1).candidate(|| 1).ignore(|_, _| false);

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();

    assert_eq!(first.name(), second.name());
    assert_eq!(first.ignore_count(), second.ignore_count());
    let ids = |spec: &ExperimentSpec<i64>| -> Vec<PredicateId> {
        spec.ignore_predicates().map(IgnorePredicate::id).collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn three_distinct_ignores_three_members() {
    let mut builder = ExperimentBuilder::<i64>::new("ignores").unwrap();
    builder
        .control(|| 1)
        .candidate(|| 2)
        .ignore(|control, _| *control < 0)
        .ignore(|_, candidate| *candidate < 0)
        .ignore_async(|control, candidate| async move { control == -candidate });

    assert_eq!(builder.build().unwrap().ignore_count(), 3);
}

#[test]
fn same_ignore_handle_one_member() {
    let predicate = IgnorePredicate::<i64>::from_fn(|_, _| true);
    let mut builder = ExperimentBuilder::<i64>::new("dedup").unwrap();
    builder
        .control(|| 1)
        .candidate(|| 2)
        .ignore_predicate(predicate.clone())
        .ignore_predicate(predicate.clone());

    let spec = builder.build().unwrap();
    assert_eq!(spec.ignore_count(), 1);
    assert_eq!(spec.ignore_predicates().next().map(IgnorePredicate::id), Some(predicate.id()));
}

fn both_negative(control: &i64, candidate: &i64) -> bool {
    *control < 0 && *candidate < 0
}

#[test]
fn same_ignore_fn_one_member() {
    let mut builder = ExperimentBuilder::<i64>::new("dedup-fn").unwrap();
    builder
        .control(|| 1)
        .candidate(|| 2)
        .ignore(both_negative)
        .ignore(both_negative);

    assert_eq!(builder.build().unwrap().ignore_count(), 1);
}

#[test]
fn sync_and_async_control_equivalent() {
    let mut sync = ExperimentBuilder::<i64>::new("sync").unwrap();
    sync.control(|| 42).candidate(|| 42);
    let mut asynchronous = ExperimentBuilder::<i64>::new("async").unwrap();
    asynchronous
        .control_async(|| async { 42 })
        .candidate_async(|| async { 42 });

    let sync = sync.build().unwrap();
    let asynchronous = asynchronous.build().unwrap();

    assert_eq!(sync.control().call().now_or_never(), Some(42));
    assert_eq!(asynchronous.control().call().now_or_never(), Some(42));
}

proptest! {
    #[test]
    fn prop_last_write_wins(
        declarations in prop::collection::vec(declaration(), 0..24),
        control in any::<i64>(),
        candidate in any::<i64>(),
    ) {
        let mut builder = ExperimentBuilder::<i64>::new("prop").unwrap();
        // Guarantee both behaviors exist, then shuffle in arbitrary overrides
        builder.control(move || control).candidate(move || candidate);
        for d in &declarations {
            apply(&mut builder, *d);
        }
        let spec = builder.build().unwrap();

        let expected_control = declarations.iter().rev().find_map(|d| match d {
            Declaration::Control(v) => Some(*v),
            _ => None,
        }).unwrap_or(control);
        let expected_candidate = declarations.iter().rev().find_map(|d| match d {
            Declaration::Candidate(v) => Some(*v),
            _ => None,
        }).unwrap_or(candidate);
        let expected_gate = declarations.iter().rev().find_map(|d| match d {
            Declaration::Gate(v) => Some(*v),
            _ => None,
        }).unwrap_or(true);
        let expected_compare = declarations.iter().rev().find_map(|d| match d {
            Declaration::Compare(v) => Some(*v),
            _ => None,
        });
        let expected_hook = declarations.iter().rev().find_map(|d| match d {
            Declaration::Hook(v) => Some(*v),
            _ => None,
        });

        prop_assert_eq!(spec.control().call().now_or_never(), Some(expected_control));
        prop_assert_eq!(spec.candidate().call().now_or_never(), Some(expected_candidate));
        prop_assert_eq!(spec.run_gate().call().now_or_never(), Some(expected_gate));

        match expected_compare {
            Some(answer) => {
                prop_assert_eq!(spec.results_match(&1, &2), answer);
            }
            None => {
                prop_assert!(spec.comparison().is_default());
                prop_assert!(spec.results_match(&7, &7));
                prop_assert!(!spec.results_match(&7, &8));
            }
        }

        let hook = spec.run_before_hook().now_or_never();
        match expected_hook {
            Some(true) | None => {
                prop_assert!(matches!(hook, Some(Ok(()))));
            }
            Some(false) => {
                prop_assert!(matches!(hook, Some(Err(ExperimentError::Hook { .. }))), "expected hook error, got {:?}", hook);
            }
        }
    }

    #[test]
    fn prop_missing_behavior_fails(has_control in any::<bool>(), has_candidate in any::<bool>()) {
        prop_assume!(!(has_control && has_candidate));

        let mut builder = ExperimentBuilder::<i64>::new("partial").unwrap();
        if has_control {
            builder.control(|| 1);
        }
        if has_candidate {
            builder.candidate(|| 1);
        }

        let err = builder.build().unwrap_err();
        prop_assert!(err.is_configuration_error());
        if has_control {
            prop_assert!(
                matches!(err, ExperimentError::MissingCandidate { .. }),
                "expected missing candidate"
            );
        } else {
            prop_assert!(
                matches!(err, ExperimentError::MissingControl { .. }),
                "expected missing control"
            );
        }
    }
}
