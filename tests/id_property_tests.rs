//! Property tests for composite ids

use proptest::prelude::*;
use tanuki_provider::resources::id::{
    build_three_part_id, build_two_part_id, parse_three_part_id, parse_two_part_id,
};

proptest! {
    #[test]
    fn two_part_ids_round_trip(first in "[a-z0-9/_.-]{1,32}", second in "[a-zA-Z0-9/:_.-]{1,32}") {
        let id = build_two_part_id(&first, &second);
        prop_assert_eq!(parse_two_part_id(&id).unwrap(), (first, second));
    }

    #[test]
    fn three_part_ids_round_trip(
        first in "[a-z0-9_-]{1,16}",
        second in "[a-z0-9_-]{1,16}",
        third in "[a-z0-9:_-]{1,16}",
    ) {
        let id = build_three_part_id(&first, &second, &third);
        prop_assert_eq!(parse_three_part_id(&id).unwrap(), (first, second, third));
    }

    #[test]
    fn ids_without_separator_are_rejected(id in "[a-z0-9/_.-]{0,32}") {
        prop_assert!(parse_two_part_id(&id).is_err());
    }
}
