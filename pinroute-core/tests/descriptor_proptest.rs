//! Property-based tests for descriptor parsing and list validation.

use heapless::Vec;
use pinroute_core::{parse, parse_with, ListValidator, PinEntry, PortCase, SLOTS_PER_BUS};
use pinroute_hal::mock::MockEncoder;
use pinroute_hal::{PinId, PinRole, Port};
use proptest::prelude::*;

fn all_pins() -> std::vec::Vec<PinId> {
    Port::ALL
        .into_iter()
        .flat_map(|port| (0..16).filter_map(move |number| PinId::new(port, number)))
        .collect()
}

proptest::proptest! {
    /// Rendering a pin and parsing it back is the identity.
    #[test]
    fn parse_display_roundtrip(port in 0u8..8, number in 0u8..16) {
        let id = PinId::new(Port::from_index(port).unwrap(), number).unwrap();
        assert_eq!(parse(&id.to_string()), Ok(id));
    }

    /// Surrounding spaces and tabs never change the result.
    #[test]
    fn parse_ignores_padding(
        port in 0u8..8,
        number in 0u8..16,
        left in "[ \t]{0,4}",
        right in "[ \t]{0,4}",
    ) {
        let id = PinId::new(Port::from_index(port).unwrap(), number).unwrap();
        let text = format!("{}{}{}", left, id, right);
        assert_eq!(parse(&text), Ok(id));
    }

    /// Parsing arbitrary text never panics, and folding only ever accepts more.
    #[test]
    fn parse_never_panics(text in "\\PC{0,8}") {
        if let Ok(id) = parse(&text) {
            assert_eq!(parse_with(&text, PortCase::Fold), Ok(id));
        }
    }

    /// Pin numbers above 15 are always range errors.
    #[test]
    fn parse_rejects_high_numbers(port in 0u8..8, number in 16u8..100) {
        let text = format!("P{}{}", Port::from_index(port).unwrap().letter(), number);
        assert!(parse(&text).is_err());
    }

    /// Validation keeps the order of any list of distinct pins.
    #[test]
    fn validate_preserves_order(
        pins in proptest::sample::subsequence(all_pins(), 0..=SLOTS_PER_BUS).prop_shuffle(),
        separator in prop_oneof![Just(","), Just(", "), Just(" "), Just("\t"), Just("\r\n")],
    ) {
        let list = pins
            .iter()
            .map(|id| id.to_string())
            .collect::<std::vec::Vec<_>>()
            .join(separator);
        let validator = ListValidator::new(MockEncoder, PinRole::chip_select());
        let out: Vec<PinEntry, SLOTS_PER_BUS> = validator.validate(&list, pins.len()).unwrap();

        let ids: std::vec::Vec<PinId> = out.iter().map(|e| e.id).collect();
        assert_eq!(ids, pins);
    }

    /// A list with one pin repeated is always rejected at the repeat.
    #[test]
    fn validate_rejects_repeat(
        pins in proptest::sample::subsequence(all_pins(), 1..SLOTS_PER_BUS),
        pick in any::<proptest::sample::Index>(),
    ) {
        let repeated = pins[pick.index(pins.len())];
        let mut tokens: std::vec::Vec<String> = pins.iter().map(|id| id.to_string()).collect();
        tokens.push(repeated.to_string());
        let list = tokens.join(",");

        let validator = ListValidator::new(MockEncoder, PinRole::chip_select());
        let err = validator
            .validate::<SLOTS_PER_BUS>(&list, tokens.len())
            .unwrap_err();
        assert_eq!(err.position, Some(tokens.len()));
    }
}
