//! Property-style checks over the engine: score bounds, write-once
//! first-attempt results, retry termination, hint monotonicity and the
//! mate-family gate on the alternate-mate override.

mod common;

use common::*;

use lesson_engine::{
    AttemptOutcome, ContinueOutcome, LessonSession, MoveStatus, Phase, PuzzleResult,
};

/// Drive the session to completion, answering wrong (give up) whenever the
/// puzzle id is in `wrong_once`, then correctly on its next viewing.
/// Returns the number of retry rounds it took.
fn run_to_completion(session: &mut LessonSession, wrong_once: &[&str]) -> u32 {
    let mut pending_wrong: Vec<String> = wrong_once.iter().map(|s| s.to_string()).collect();
    let mut guard = 0;
    loop {
        guard += 1;
        assert!(guard < 1000, "session failed to terminate");

        let id = session.current_puzzle().id.clone();
        if let Some(pos) = pending_wrong.iter().position(|w| *w == id) {
            pending_wrong.remove(pos);
            session.reveal_solution().unwrap();
        } else {
            solve_scholars(session);
        }

        match session.advance().unwrap() {
            ContinueOutcome::Complete { .. } => return session.round(),
            ContinueOutcome::Next { .. } | ContinueOutcome::RetryRound { .. } => {}
        }
    }
}

#[test]
fn property_score_within_bounds() {
    for wrong in [vec![], vec!["p1"], vec!["p1", "p3"], vec!["p1", "p2", "p3"]] {
        let mut session = LessonSession::new(vec![
            scholars_mate("p1"),
            scholars_mate("p2"),
            scholars_mate("p3"),
        ])
        .unwrap();
        run_to_completion(&mut session, &wrong);
        let score = session.final_score().unwrap();
        assert!(score.correct <= score.total);
        assert_eq!(score.total, 3);
        assert_eq!(score.correct, 3 - wrong.len());
    }
}

#[test]
fn property_first_attempt_written_once() {
    // p1 is answered wrong in the primary pass and again in retry round 1;
    // its first-attempt result must survive both retry finalizations.
    let mut session =
        LessonSession::new(vec![scholars_mate("p1"), scholars_mate("p2")]).unwrap();

    session.reveal_solution().unwrap(); // p1 primary: wrong
    session.advance().unwrap();
    solve_scholars(&mut session); // p2 primary: correct
    session.advance().unwrap();

    assert_eq!(session.phase(), Phase::Retry);
    session.reveal_solution().unwrap(); // p1 retry 1: wrong again
    session.advance().unwrap();
    solve_scholars(&mut session); // p1 retry 2: correct
    session.advance().unwrap();

    assert!(session.is_complete());
    let tracker = session.score_tracker();
    assert_eq!(tracker.first_attempt_result("p1"), Some(PuzzleResult::Wrong));
    assert_eq!(tracker.latest_result("p1"), Some(PuzzleResult::Correct));
    assert_eq!(session.final_score().unwrap().correct, 1);
}

#[test]
fn property_retry_rounds_bounded_by_batch() {
    // Worst case: every puzzle is missed exactly once, staggered so each
    // retry round still contains a miss. Rounds never exceed the batch.
    let ids = ["p1", "p2", "p3", "p4"];
    let puzzles = ids.iter().map(|id| scholars_mate(id)).collect();
    let mut session = LessonSession::new(puzzles).unwrap();

    // Primary: everything wrong.
    for _ in &ids {
        session.reveal_solution().unwrap();
        session.advance().unwrap();
    }
    // Each retry round: solve the first puzzle of the round, miss the rest.
    let mut rounds = 1;
    while !session.is_complete() {
        let (index, _) = session.pass_progress();
        if index == 0 {
            solve_scholars(&mut session);
        } else {
            session.reveal_solution().unwrap();
        }
        if let ContinueOutcome::RetryRound { round, .. } = session.advance().unwrap() {
            rounds = round;
        }
    }
    assert!(rounds as usize <= ids.len());
    assert_eq!(session.final_score().unwrap().correct, 0);
}

#[test]
fn property_hint_appears_exactly_at_three_misses() {
    let mut session = LessonSession::new(vec![ladder_mate("p1")]).unwrap();
    let wrong = cand("b5", "b6");

    session.attempt(&wrong).unwrap();
    session.attempt(&wrong).unwrap();
    assert!(session.hint().is_none(), "no hint before the third miss");

    session.attempt(&wrong).unwrap();
    assert_eq!(
        session.hint(),
        Some(("b5".parse().unwrap(), "b7".parse().unwrap()))
    );

    // A correct move resets the ladder; the next solution index needs its
    // own three misses before a new hint.
    let key = match session.attempt(&cand("b5", "b7")).unwrap() {
        AttemptOutcome::Correct {
            reply: Some(key), ..
        } => key,
        other => panic!("expected a pending reply, got {other:?}"),
    };
    session.apply_reply(&key);
    assert!(session.hint().is_none());

    let wrong_second = cand("b7", "b8");
    session.attempt(&wrong_second).unwrap();
    session.attempt(&wrong_second).unwrap();
    assert!(session.hint().is_none());
    session.attempt(&wrong_second).unwrap();
    assert_eq!(
        session.hint(),
        Some(("a6".parse().unwrap(), "a8".parse().unwrap()))
    );
}

#[test]
fn property_alternate_mate_gated_on_theme() {
    // Identical board, identical mating move; only the tags differ.
    let mut tagged = LessonSession::new(vec![back_rank_with_themes("m", &["mateIn1"])]).unwrap();
    match tagged.attempt(&cand("d1", "d8")).unwrap() {
        AttemptOutcome::Correct { mate_override, .. } => assert!(mate_override),
        other => panic!("mate-tagged puzzle must accept the alternate mate, got {other:?}"),
    }

    let mut untagged =
        LessonSession::new(vec![back_rank_with_themes("f", &["fork", "pin"])]).unwrap();
    match untagged.attempt(&cand("d1", "d8")).unwrap() {
        AttemptOutcome::Incorrect { .. } => {}
        other => panic!("non-mate puzzle must stay strict, got {other:?}"),
    }
    assert_eq!(untagged.move_status(), MoveStatus::Playing);

    // The recorded move is still accepted either way.
    match untagged.attempt(&cand("e1", "e8")).unwrap() {
        AttemptOutcome::Correct { mate_override, .. } => assert!(!mate_override),
        other => panic!("recorded solution must match, got {other:?}"),
    }
}
