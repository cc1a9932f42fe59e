use proptest::prelude::*;

use tru_types::{ClaimState, Coin, Timestamp, UserAddress};

const ALL_STATES: [ClaimState; 5] = [
    ClaimState::Created,
    ClaimState::Challenged,
    ClaimState::Confirmed,
    ClaimState::Rejected,
    ClaimState::Expired,
];

proptest! {
    /// Adding then subtracting the same coin restores the original amount.
    #[test]
    fn coin_add_sub_inverse(a in 0u128..u128::MAX / 2, b in 0u128..u128::MAX / 2) {
        let x = Coin::new("trusteak", a);
        let y = Coin::new("trusteak", b);
        let sum = x.checked_add(&y).unwrap();
        prop_assert_eq!(sum.checked_sub(&y).unwrap(), x);
    }

    /// Coin addition is commutative and never silently wraps.
    #[test]
    fn coin_add_commutative(a in any::<u128>(), b in any::<u128>()) {
        let x = Coin::new("trusteak", a);
        let y = Coin::new("trusteak", b);
        prop_assert_eq!(x.checked_add(&y), y.checked_add(&x));
        prop_assert_eq!(x.checked_add(&y).is_none(), a.checked_add(b).is_none());
    }

    /// Big-endian key bytes sort exactly like the timestamps themselves.
    #[test]
    fn timestamp_key_order_matches_time_order(a in any::<u64>(), b in any::<u64>()) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta.cmp(&tb), ta.to_be_bytes().cmp(&tb.to_be_bytes()));
    }

    /// Any chain of legal transitions never revisits a state.
    #[test]
    fn claim_transitions_are_acyclic(picks in prop::collection::vec(0usize..5, 1..12)) {
        let mut current = ClaimState::Created;
        let mut seen = vec![current];
        for pick in picks {
            let next = ALL_STATES[pick];
            if current.can_transition_to(next) {
                prop_assert!(!seen.contains(&next));
                seen.push(next);
                current = next;
            }
        }
    }

    /// Well-formed address bodies always parse and keep their text.
    #[test]
    fn address_parse_accepts_alphanumeric(body in "[a-z0-9_]{1,40}") {
        let raw = format!("tru{}", body);
        let addr = UserAddress::parse(raw.clone()).unwrap();
        prop_assert_eq!(addr.as_str(), raw.as_str());
    }
}
