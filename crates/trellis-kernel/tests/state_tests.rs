//! Property tests over random move sequences

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use trellis_kernel::test_harness::demo_template;
use trellis_kernel::{Move, MoveOutcome, Navigator, RejectionKind, SessionStatus};
use trellis_store::FallbackChain;
use trellis_test_utils::{linear_template, text};
use trellis_tree::{ExperimentTemplate, Section};

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn navigator(template: &ExperimentTemplate, seed: u64) -> Navigator {
    let tree = template.instantiate(&mut StdRng::seed_from_u64(seed));
    Navigator::new(format!("prop-{seed}"), tree, FallbackChain::empty())
}

#[derive(Debug, Clone)]
enum Step {
    Forward,
    Backward,
    Jump(usize),
    Fill,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Forward),
        2 => Just(Step::Backward),
        2 => (0usize..16).prop_map(Step::Jump),
        2 => Just(Step::Fill),
    ]
}

fn fill_current_page(nav: &mut Navigator) {
    let Some(current) = nav.current_page() else {
        return;
    };
    let names: Vec<String> = nav
        .tree()
        .page(current)
        .map(|page| {
            page.elements()
                .iter()
                .filter(|e| e.is_input())
                .filter_map(|e| e.name().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    for name in names {
        let value = match name.as_str() {
            "consent" => text("yes"),
            "q1" => serde_json::json!(3),
            "q2" => text("fine"),
            "rating" => text("high"),
            _ => text("ok"),
        };
        // closed pages refuse input
        let _ = nav.submit(&name, value);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn forward_is_always_refused_where_the_section_forbids_it(
        pages in 2usize..6,
        attempts in 1usize..5,
    ) {
        let template = linear_template(Section::new("exp").allow_forward(false), pages);
        block_on(async {
            let mut nav = navigator(&template, 0);
            nav.start().await.unwrap();
            for _ in 0..attempts {
                let outcome = nav.request_move(Move::Forward).await.unwrap();
                assert_eq!(outcome.rejection_kind(), Some(RejectionKind::DirectionNotAllowed));
            }
            assert_eq!(nav.current_position().map(ToString::to_string).as_deref(), Some("exp.p0"));
            assert!(nav.history().is_empty());
        });
    }

    #[test]
    fn forward_then_backward_returns_to_the_start(pages in 2usize..8, steps in 1usize..8) {
        let steps = steps.min(pages - 1);
        let template = linear_template(Section::new("exp"), pages);
        block_on(async {
            let mut nav = navigator(&template, 1);
            nav.start().await.unwrap();
            for _ in 0..steps {
                assert!(nav.request_move(Move::Forward).await.unwrap().is_committed());
            }
            for _ in 0..steps {
                assert!(nav.request_move(Move::Backward).await.unwrap().is_committed());
            }
            assert_eq!(nav.current_position().map(ToString::to_string).as_deref(), Some("exp.p0"));
            assert_eq!(nav.history().len(), steps * 2);
        });
    }

    #[test]
    fn random_sessions_keep_their_invariants(
        seed in any::<u64>(),
        steps in prop::collection::vec(step(), 1..40),
    ) {
        let template = demo_template().unwrap();
        let pages: Vec<_> = {
            let tree = template.tree();
            tree.pages().into_iter().map(|id| tree.path(id).clone()).collect()
        };
        block_on(async {
            let mut nav = navigator(&template, seed);
            nav.start().await.unwrap();

            for step in steps {
                let mv = match step {
                    Step::Fill => {
                        fill_current_page(&mut nav);
                        continue;
                    }
                    Step::Forward => Move::Forward,
                    Step::Backward => Move::Backward,
                    Step::Jump(i) => Move::Jump(pages[i % pages.len()].clone()),
                };

                let status = nav.status();
                let position = nav.current_position().cloned();
                let history = nav.history().to_vec();

                let outcome = nav.request_move(mv).await.unwrap();
                assert!(nav.status().rank() >= status.rank());
                assert!(nav.history().starts_with(&history));

                match outcome {
                    MoveOutcome::Rejected(_) => {
                        assert_eq!(nav.current_position().cloned(), position);
                        assert_eq!(nav.history().len(), history.len());
                    }
                    MoveOutcome::Committed { .. } | MoveOutcome::Finished { .. } => {
                        assert_eq!(nav.history().len(), history.len() + 1);
                    }
                }

                if nav.status() == SessionStatus::Finished {
                    let after = nav.request_move(Move::Forward).await.unwrap();
                    assert_eq!(after.rejection_kind(), Some(RejectionKind::SessionNotRunning));
                    break;
                }
            }
            assert!(nav.journal().verify_integrity().is_ok());
        });
    }
}
