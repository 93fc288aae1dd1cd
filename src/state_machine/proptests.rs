//! Property-based tests for the session state machine

use super::*;
use crate::db::Sender;
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z ]{1,30}",
        1 => Just("fim da interação".to_string()),
        1 => Just("FIM DA INTERACAO".to_string()),
        1 => Just("fim".to_string()),
    ]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![Just(SessionState::Active), Just(SessionState::Ended)]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_text().prop_map(|text| Event::PlayerMessage { text }),
        arb_text().prop_map(|text| Event::BackendMessage { text }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Ended is terminal: no event sequence brings a session back
    #[test]
    fn prop_ended_is_terminal(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = SessionState::Active;
        let mut seen_end = false;

        for event in events {
            if let Ok(result) = transition(state, event) {
                state = result.new_state;
            }
            if state == SessionState::Ended {
                seen_end = true;
            }
            prop_assert!(!(seen_end && state == SessionState::Active));
        }
    }

    // The session is closed at most once across any history
    #[test]
    fn prop_close_emitted_at_most_once(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = SessionState::Active;
        let mut closes = 0;

        for event in events {
            if let Ok(result) = transition(state, event) {
                closes += result
                    .effects
                    .iter()
                    .filter(|e| matches!(e, Effect::CloseSession))
                    .count();
                state = result.new_state;
            }
        }
        prop_assert!(closes <= 1);
    }

    // Every accepted event persists exactly one message, first
    #[test]
    fn prop_accepted_event_persists_one_message(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(state, event.clone()) {
            let persisted: Vec<_> = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::PersistMessage { .. }))
                .collect();
            prop_assert_eq!(persisted.len(), 1);
            prop_assert!(
                matches!(result.effects[0], Effect::PersistMessage { .. }),
                "first effect must persist the message"
            );

            let expected_sender = match event {
                Event::PlayerMessage { .. } => Sender::Player,
                Event::BackendMessage { .. } => Sender::Backend,
            };
            prop_assert!(
                matches!(
                    &result.effects[0],
                    Effect::PersistMessage { sender, .. } if *sender == expected_sender
                ),
                "persisted sender must be {:?}",
                expected_sender
            );
        }
    }

    // Player messages are rejected exactly when the session has ended
    #[test]
    fn prop_player_accepted_iff_active(state in arb_state(), text in arb_text()) {
        let result = transition(state, Event::PlayerMessage { text });
        prop_assert_eq!(result.is_ok(), state.is_active());
    }

    // Backend messages are never rejected
    #[test]
    fn prop_backend_always_recorded(state in arb_state(), text in arb_text()) {
        let recorded = transition(state, Event::BackendMessage { text }).is_ok();
        prop_assert!(recorded, "backend message rejected in {:?}", state);
    }

    // Player messages never end the session, even the terminator phrase
    #[test]
    fn prop_player_terminator_is_just_text(text in arb_text()) {
        let result = transition(SessionState::Active, Event::PlayerMessage { text }).unwrap();
        prop_assert_eq!(result.new_state, SessionState::Active);
        prop_assert!(!result.terminator);
    }
}
