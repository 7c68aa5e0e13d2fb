//! Property-based tests for protocol-level invariants. Codec framing is
//! exercised exhaustively already in `radiolink`'s own unit tests, so
//! these stick to invariants that only show up once a sender and
//! receiver actually run against each other.

mod common;

use proptest::prelude::*;

use common::{image_bytes, run_scenario};
use protocol::geometry::{packets_this_page, total_packets, total_pages, total_pages_from_packets};
use protocol::receiver::Completion;
use simradio::BusConfig;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Below the loss rate the recovery loop is sized for, a single
    /// receiver always converges to a bit-exact copy of the image,
    /// regardless of how small or large the image is.
    #[test]
    fn liveness_under_bounded_loss(
        len in 1usize..9000,
        drop_fraction in 0.0f64..0.2,
        seed in any::<u64>(),
    ) {
        let image = image_bytes(len);
        let bus_config = BusConfig { drop_fraction, duplicate_fraction: 0.0, seed };
        let results = run_scenario(image.clone(), 1, bus_config, None);
        let (completion, receiver) = &results[0];

        prop_assert!(matches!(completion, Completion::Transferred));
        prop_assert_eq!(receiver.flash().committed_image(image.len()), image.as_slice());
    }

    /// Duplicated frames never corrupt the result: a packet that has
    /// already landed is simply ignored the second time.
    #[test]
    fn idempotent_under_duplication(
        len in 1usize..5000,
        duplicate_fraction in 0.0f64..0.6,
        seed in any::<u64>(),
    ) {
        let image = image_bytes(len);
        let bus_config = BusConfig { drop_fraction: 0.0, duplicate_fraction, seed };
        let results = run_scenario(image.clone(), 1, bus_config, None);
        let (completion, receiver) = &results[0];

        prop_assert!(matches!(completion, Completion::Transferred));
        prop_assert_eq!(receiver.flash().committed_image(image.len()), image.as_slice());
    }

    /// Page/packet geometry is a bijection in both directions: deriving
    /// `total_pages` from a packet count the receiver announced must
    /// agree with the page count the sender computed from the same
    /// image length, and packet counts per page must sum back to the
    /// total.
    #[test]
    fn geometry_is_consistent(len in 1usize..200_000) {
        let packets = total_packets(len);
        let pages = total_pages(len);
        prop_assert_eq!(total_pages_from_packets(packets), pages);

        let mut sum = 0u32;
        for page in 1..=pages {
            sum += packets_this_page(packets, pages, page) as u32;
        }
        prop_assert_eq!(sum, packets as u32);
    }
}
