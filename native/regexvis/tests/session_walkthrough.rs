//! End-to-end walkthrough of a session through its public API, watching
//! the history as it goes.

use std::cell::RefCell;
use std::rc::Rc;

use regexvis::automaton::AutomatonSnapshot;
use regexvis::{Automaton, EngineConfig, Error, HistoryEvent, IsolationPolicy, Session};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn labels(session: &Session) -> Vec<(u32, u32, String)> {
    let mut out: Vec<_> = session
        .automaton()
        .transitions()
        .map(|t| (t.from(), t.to(), t.regex().to_string()))
        .collect();
    out.sort();
    out
}

#[test]
fn choice_and_sequence_breakdowns() {
    init_logging();
    let mut session = Session::from_regex("a|b", EngineConfig::default()).unwrap();
    let id = session.automaton().transitions().next().unwrap().id();
    assert!(session.breakdown_transition(id).unwrap());
    assert_eq!(session.automaton().state_count(), 2);
    assert_eq!(labels(&session), vec![(0, 1, "a".into()), (0, 1, "b".into())]);

    let mut session = Session::from_regex("ab", EngineConfig::default()).unwrap();
    assert_eq!(session.breakdown_all().unwrap(), 1);
    assert_eq!(session.automaton().state_count(), 3);
    assert_eq!(labels(&session), vec![(0, 2, "a".into()), (2, 1, "b".into())]);
}

#[test]
fn star_without_isolation() {
    init_logging();
    let mut session = Session::from_regex("a*", EngineConfig::default()).unwrap();
    session.breakdown_all().unwrap();
    assert_eq!(session.automaton().state_count(), 2);
    assert_eq!(labels(&session), vec![(0, 1, "ε".into()), (1, 0, "a".into())]);

    let config = EngineConfig {
        isolation: IsolationPolicy::Full,
        ..EngineConfig::default()
    };
    let mut session = Session::from_regex("a*", config).unwrap();
    session.breakdown_all().unwrap();
    assert_eq!(session.automaton().state_count(), 4);
}

#[test]
fn history_events_follow_the_session() {
    init_logging();
    let config = EngineConfig::from_toml_str("clobber_history = true").unwrap();
    let mut session = Session::from_regex("(a|b)c", config).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session
        .history_mut()
        .subscribe(move |event| sink.borrow_mut().push(event.clone()));

    assert_eq!(session.breakdown_all().unwrap(), 2);
    assert!(session.undo());
    assert!(session.undo());
    session.breakdown_all().unwrap();

    let events = events.borrow();
    assert_eq!(
        events[..4],
        [
            HistoryEvent::Executed { position: 2 },
            HistoryEvent::Executed { position: 3 },
            HistoryEvent::PositionChanged { from: 3, to: 2 },
            HistoryEvent::PositionChanged { from: 2, to: 1 },
        ]
    );
    assert_eq!(events[4], HistoryEvent::Truncated { len: 1, removed: 2 });
    assert_eq!(session.history().len(), 3);
}

#[test]
fn seeking_out_of_range_changes_nothing() {
    init_logging();
    let mut session = Session::from_regex("ab", EngineConfig::default()).unwrap();
    session.breakdown_all().unwrap();
    let before = session.automaton().snapshot();
    assert!(matches!(
        session.seek(5),
        Err(Error::OutOfRange { index: 5, size: 2 })
    ));
    assert_eq!(session.automaton().snapshot(), before);
}

#[test]
fn snapshot_resumes_editing() {
    init_logging();
    let mut session = Session::from_regex("(ab)*", EngineConfig::default()).unwrap();
    session.determinize().unwrap();
    let json = serde_json::to_string(&session.automaton().snapshot()).unwrap();

    let snapshot: AutomatonSnapshot = serde_json::from_str(&json).unwrap();
    let automaton = Automaton::from_snapshot(&snapshot).unwrap();
    let mut resumed = Session::from_automaton(automaton, EngineConfig::default());
    assert!(resumed.history().is_empty());
    for (word, expected) in [("", true), ("ab", true), ("abab", true), ("a", false), ("aba", false)] {
        assert_eq!(resumed.automaton().simulate(word), Some(expected), "{word}");
    }

    let regex = resumed.to_regex().unwrap().unwrap();
    assert!(regex.is_nullable());
    let mut again = Session::from_regex(&regex.to_string(), EngineConfig::default()).unwrap();
    again.breakdown_all().unwrap();
    for (word, expected) in [("", true), ("ab", true), ("ababab", true), ("b", false), ("abb", false)] {
        assert_eq!(again.automaton().simulate(word), Some(expected), "{word} via {regex}");
    }
}
