//! End-to-end session scenarios: category completion, rule switching,
//! error classification and aggregation through the public API.

use wcst::config::SessionConfig;
use wcst::rules::{RuleOrder, SwitchPolicy};
use wcst::session::{Session, SessionBootstrap, SessionStatus, TerminationReason};
use wcst::summary::compute_summary;
use wcst::types::{Card, Dimension};
use wcst::WcstError;

const SEED: u64 = 20_261_019;

fn start(config: SessionConfig) -> Session {
    Session::start(
        SessionBootstrap::new("P001")
            .with_session_id("session-1")
            .with_seed(SEED),
        config,
    )
    .unwrap()
}

/// Reference index matching the current stimulus on `dim`.
fn card_for(session: &Session, dim: Dimension) -> usize {
    let stim = session.current_stimulus().unwrap();
    session.reference_deck().matching_index(&stim, dim)
}

/// Reference index that matches the current stimulus on no dimension.
fn card_matching_nothing(session: &Session) -> usize {
    let stim: Card = session.current_stimulus().unwrap();
    (0..4)
        .find(|&i| session.reference_deck().rules_consistent_with(&stim, i).is_empty())
        .unwrap()
}

// ── Scenario A: first category ───────────────────────────────────────

#[test]
fn scenario_a_first_category_on_trial_ten() {
    let mut s = start(SessionConfig::default());
    for trial in 1..=10 {
        let rec = s.submit_response(card_for(&s, Dimension::Color), 700.0).unwrap();
        assert!(rec.correct);
        assert_eq!(rec.rule, Dimension::Color);
        if trial < 10 {
            assert_eq!(rec.categories_completed, 0);
            assert_eq!(rec.consecutive_correct, trial);
        } else {
            assert_eq!(rec.categories_completed, 1);
            assert_eq!(rec.consecutive_correct, 0);
            assert_eq!(rec.category_index, 0);
        }
    }

    // Trial 11 runs under shape and is the shift trial.
    let rec = s.submit_response(card_for(&s, Dimension::Shape), 700.0).unwrap();
    assert_eq!(rec.trial_index, 10);
    assert_eq!(rec.rule, Dimension::Shape);
    assert_eq!(rec.prev_rule, Some(Dimension::Color));
    assert!(rec.is_shift_trial);
    assert!(rec.correct);

    let summary = s.summary();
    assert_eq!(summary.trials_to_complete_first_category, 10);
    assert_eq!(summary.trials_per_category, vec![10]);
    assert_eq!(summary.categories_completed, 1);
}

// ── Scenario B: failure to maintain set ──────────────────────────────

#[test]
fn scenario_b_set_loss_after_six_correct() {
    let mut s = start(SessionConfig::default());
    for _ in 0..6 {
        assert!(s.submit_response(card_for(&s, Dimension::Color), 600.0).unwrap().correct);
    }
    let rec = s.submit_response(card_matching_nothing(&s), 900.0).unwrap();
    assert!(!rec.correct);
    assert!(rec.is_non_perseverative_error);
    assert!(!rec.is_perseverative_error);
    assert!(rec.set_maintenance_error);
    assert_eq!(rec.consecutive_correct, 0);
    assert_eq!(rec.rule, Dimension::Color);

    let summary = s.summary();
    assert_eq!(summary.failure_to_maintain_set, 1);
    assert_eq!(summary.non_perseverative_errors, 1);
}

#[test]
fn error_after_short_run_is_not_set_loss() {
    let mut s = start(SessionConfig::default());
    for _ in 0..4 {
        s.submit_response(card_for(&s, Dimension::Color), 600.0).unwrap();
    }
    let rec = s.submit_response(card_for(&s, Dimension::Number), 600.0).unwrap();
    assert!(!rec.correct);
    assert!(!rec.set_maintenance_error);
}

// ── Scenario C: perseverative error after a switch ───────────────────

#[test]
fn scenario_c_perseverative_error_after_switch() {
    let mut s = start(SessionConfig::default());
    for _ in 0..10 {
        s.submit_response(card_for(&s, Dimension::Color), 600.0).unwrap();
    }
    let color_card = card_for(&s, Dimension::Color);
    assert_ne!(color_card, card_for(&s, Dimension::Shape));
    let rec = s.submit_response(color_card, 650.0).unwrap();
    assert_eq!(rec.rule, Dimension::Shape);
    assert_eq!(rec.prev_rule, Some(Dimension::Color));
    assert!(!rec.correct);
    assert!(rec.is_perseverative_response);
    assert!(rec.is_perseverative_error);
    assert!(!rec.is_non_perseverative_error);
    assert_eq!(rec.error_type().as_str(), "perseverative");
}

#[test]
fn perseveration_ignores_rules_before_the_previous_one() {
    let mut s = start(SessionConfig::default());
    for rule in [Dimension::Color, Dimension::Shape] {
        for _ in 0..10 {
            assert!(s.submit_response(card_for(&s, rule), 600.0).unwrap().correct);
        }
    }
    assert_eq!(s.categories_completed(), 2);

    // Under number, with shape as the previous rule, sorting by color is
    // an error but not a perseverative one.
    let rec = s.submit_response(card_for(&s, Dimension::Color), 650.0).unwrap();
    assert_eq!(rec.rule, Dimension::Number);
    assert_eq!(rec.prev_rule, Some(Dimension::Shape));
    assert!(!rec.correct);
    assert!(!rec.is_perseverative_response);
    assert!(!rec.is_perseverative_error);
    assert!(rec.is_non_perseverative_error);
    assert_eq!(rec.error_type().as_str(), "non-perseverative");

    let rec = s.submit_response(card_for(&s, Dimension::Shape), 650.0).unwrap();
    assert!(rec.is_perseverative_error);
}

// ── Scenario D: empty log ────────────────────────────────────────────

#[test]
fn scenario_d_empty_log_summary() {
    let s = start(SessionConfig::default());
    let summary = s.summary();
    assert_eq!(summary.total_trials, 0);
    assert_eq!(summary.mean_rt, 0.0);
    assert!(summary.trials_per_category.is_empty());
    assert_eq!(summary, compute_summary(&[]));
}

// ── Conceptual responses ─────────────────────────────────────────────

#[test]
fn conceptual_responses_start_at_third_correct() {
    let mut s = start(SessionConfig::default());
    let flags: Vec<bool> = (0..5)
        .map(|_| {
            s.submit_response(card_for(&s, Dimension::Color), 500.0)
                .unwrap()
                .is_conceptual_response
        })
        .collect();
    assert_eq!(flags, vec![false, false, true, true, true]);
}

// ── Full administration ──────────────────────────────────────────────

#[test]
fn six_categories_with_cyclic_rules() {
    let mut s = start(SessionConfig::default());
    let order = RuleOrder::default();
    let mut rule = order.first();
    let mut rules_seen = vec![rule];
    while s.is_active() {
        let rec = s.submit_response(card_for(&s, rule), 500.0).unwrap();
        if rec.correct && rec.consecutive_correct == 0 {
            rule = order.after(rule);
            rules_seen.push(rule);
        }
    }
    use Dimension::*;
    assert_eq!(rules_seen, vec![Color, Shape, Number, Color, Shape, Number, Color]);
    assert_eq!(s.status(), SessionStatus::Completed(TerminationReason::MaxCategories));

    let summary = s.summary();
    assert_eq!(summary.total_trials, 60);
    assert_eq!(summary.trials_per_category, vec![10; 6]);
    assert_eq!(summary.learning_to_learn, 0.0);
    assert_eq!(summary.shift_efficiency_mean, 10.0);
    assert_eq!(summary.total_errors, 0);
}

#[test]
fn random_policy_switches_to_a_different_rule() {
    let mut config = SessionConfig::default();
    config.switch_policy = SwitchPolicy::Random;
    config.max_categories = 3;
    let mut s = start(config);
    let mut previous: Option<Dimension> = None;
    while s.is_active() {
        // Try every rule until one is confirmed, then ride it to completion.
        let mut confirmed = None;
        for dim in Dimension::ALL {
            if Some(dim) == previous {
                continue;
            }
            let rec = s.submit_response(card_for(&s, dim), 500.0).unwrap();
            if rec.correct {
                confirmed = Some(rec.rule);
                break;
            }
        }
        let rule = confirmed.unwrap();
        assert_ne!(Some(rule), previous);
        while s.is_active() && s.log().last().map_or(true, |r| r.consecutive_correct != 0) {
            s.submit_response(card_for(&s, rule), 500.0).unwrap();
        }
        previous = Some(rule);
    }
    assert_eq!(s.categories_completed(), 3);
}

#[test]
fn trial_limit_reported_before_categories() {
    let mut config = SessionConfig::default();
    config.max_trials = 15;
    let mut s = start(config);
    while s.is_active() {
        s.submit_response(card_for(&s, Dimension::Shape), 500.0).unwrap();
    }
    assert_eq!(s.status(), SessionStatus::Completed(TerminationReason::MaxTrials));
    assert_eq!(s.log().len(), 15);
    assert_eq!(s.summary().categories_completed, 0);
    assert!(matches!(
        s.submit_response(0, 500.0),
        Err(WcstError::InvalidOperation(_))
    ));
}

#[test]
fn partial_session_summary_after_withdrawal() {
    let mut s = start(SessionConfig::default());
    for _ in 0..3 {
        s.submit_response(card_for(&s, Dimension::Color), 400.0).unwrap();
    }
    s.submit_response(card_matching_nothing(&s), 800.0).unwrap();
    s.abandon().unwrap();
    let summary = s.summary();
    assert_eq!(summary.total_trials, 4);
    assert_eq!(summary.total_errors, 1);
    assert_eq!(summary.mean_rt_correct, 400.0);
    assert_eq!(summary.mean_rt_error, 800.0);
    assert_eq!(summary.mean_rt, 500.0);
    assert_eq!(summary.trials_to_complete_first_category, 0);
}
