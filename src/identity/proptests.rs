//! Property tests for identity normalization

use super::*;
use proptest::prelude::*;

fn arb_handle() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,64}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Normalizing twice gives the same answer as normalizing once
    #[test]
    fn prop_handle_normalization_is_idempotent(handle in arb_handle()) {
        let once = normalize_player(&handle);
        let twice = once.as_deref().and_then(normalize_player);
        prop_assert_eq!(once, twice);
    }

    /// Handles that are not phone numbers come back unchanged
    #[test]
    fn prop_non_numeric_handle_is_fixed_point(handle in arb_handle()) {
        prop_assume!(!handle.chars().all(|c| c.is_ascii_digit()));
        prop_assume!(phone_digits(&handle).is_none());
        prop_assert_eq!(normalize_player(&handle), Some(handle));
    }

    /// Hyphen and space separators give the same id for one number
    #[test]
    fn prop_phone_separators_agree(first in "[1-9]", rest in "[0-9]{7,14}", width in 2usize..5) {
        let digits = format!("{first}{rest}");
        let groups: Vec<String> = rest
            .chars()
            .collect::<Vec<_>>()
            .chunks(width)
            .map(|chunk| chunk.iter().collect())
            .collect();
        let hyphenated = format!("{first}-{}", groups.join("-"));
        let spaced = format!("+{first} ({}", groups.join(") "));
        prop_assert_eq!(normalize_player(&hyphenated), Some(digits.clone()));
        prop_assert_eq!(normalize_player(&spaced), Some(digits));
    }

    /// Idempotence holds for arbitrary text too, not only handles
    #[test]
    fn prop_any_text_normalization_is_idempotent(raw in "\\PC{0,80}") {
        let once = normalize_player(&raw);
        let twice = once.as_deref().and_then(normalize_player);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_short_digit_runs_rejected(digits in "[0-9]{1,7}") {
        prop_assert_eq!(normalize_player(&digits), None);
    }

    #[test]
    fn prop_long_digit_runs_rejected(digits in "[0-9]{16,30}") {
        prop_assert_eq!(normalize_player(&digits), None);
    }

    #[test]
    fn prop_leading_zero_digit_runs_rejected(rest in "[0-9]{7,14}") {
        let digits = format!("0{rest}");
        prop_assert_eq!(normalize_player(&digits), None);
    }

    #[test]
    fn prop_valid_e164_digits_accepted(first in "[1-9]", rest in "[0-9]{7,14}") {
        let digits = format!("{first}{rest}");
        prop_assert_eq!(normalize_player(&digits), Some(digits));
    }

    /// Whatever comes out is a valid handle
    #[test]
    fn prop_output_matches_handle_pattern(raw in "\\PC{0,120}") {
        if let Some(player) = normalize_player(&raw) {
            prop_assert!(HANDLE_PATTERN.is_match(&player), "{}", player);
        }
    }

    #[test]
    fn prop_generated_ids_are_valid_e164(cc in "[0-9+ ]{0,6}") {
        let id = generate_player_id(&cc);
        prop_assert!(E164_PATTERN.is_match(&id), "{}", id);
    }

    #[test]
    fn prop_validate_message_enforces_bounds(
        text in "[a-z ]{0,20}",
        min_len in 1usize..5,
        extra in 0usize..10,
    ) {
        let limits = MessageLimits { min_len, max_len: min_len + extra };
        let trimmed_len = text.trim().chars().count();
        match validate_message(Some(&text), &limits) {
            Ok(clean) => {
                prop_assert_eq!(clean.as_str(), text.trim());
                prop_assert!(trimmed_len >= limits.min_len && trimmed_len <= limits.max_len);
            }
            Err(_) => {
                prop_assert!(trimmed_len < limits.min_len || trimmed_len > limits.max_len);
            }
        }
    }

    #[test]
    fn prop_terminator_rejects_supersets(prefix in "[a-z]{1,10} ") {
        let text = format!("{prefix}fim da interação");
        prop_assert!(!is_conversation_terminator(&text));
    }
}
