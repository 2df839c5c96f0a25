use serde::{Deserialize, Serialize};

/// Protocol upgrades in mainnet activation order.
///
/// The discriminant order is load-bearing: every fork-dependent gas rule
/// gates on [`Fork::is_activated`], which is a plain ordinal comparison.
#[repr(u8)]
#[derive(
    Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize,
)]
pub enum Fork {
    Frontier = 0,
    Homestead = 1,
    Tangerine = 2,
    SpuriousDragon = 3,
    Byzantium = 4,
    Constantinople = 5,
    Petersburg = 6,
    Istanbul = 7,
    Berlin = 8,
    London = 9,
    Paris = 10,
    Shanghai = 11,
    #[default]
    Cancun = 12,
    Prague = 13,
}

impl Fork {
    /// True if `self` is `fork` itself or any later upgrade.
    #[inline]
    pub const fn is_activated(self, fork: Fork) -> bool {
        self as u8 >= fork as u8
    }
}

impl From<Fork> for &str {
    fn from(fork: Fork) -> Self {
        match fork {
            Fork::Frontier => "Frontier",
            Fork::Homestead => "Homestead",
            Fork::Tangerine => "Tangerine",
            Fork::SpuriousDragon => "SpuriousDragon",
            Fork::Byzantium => "Byzantium",
            Fork::Constantinople => "Constantinople",
            Fork::Petersburg => "Petersburg",
            Fork::Istanbul => "Istanbul",
            Fork::Berlin => "Berlin",
            Fork::London => "London",
            Fork::Paris => "Paris",
            Fork::Shanghai => "Shanghai",
            Fork::Cancun => "Cancun",
            Fork::Prague => "Prague",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_is_reflexive() {
        for fork in [Fork::Frontier, Fork::Istanbul, Fork::Berlin, Fork::Prague] {
            assert!(fork.is_activated(fork));
        }
    }

    #[test]
    fn activation_follows_upgrade_order() {
        assert!(Fork::Berlin.is_activated(Fork::Istanbul));
        assert!(Fork::Prague.is_activated(Fork::Frontier));
        assert!(!Fork::Istanbul.is_activated(Fork::Berlin));
        assert!(!Fork::Frontier.is_activated(Fork::Homestead));
    }

    #[test]
    fn activation_matches_total_order() {
        let forks = [
            Fork::Frontier,
            Fork::Homestead,
            Fork::Tangerine,
            Fork::SpuriousDragon,
            Fork::Byzantium,
            Fork::Constantinople,
            Fork::Petersburg,
            Fork::Istanbul,
            Fork::Berlin,
            Fork::London,
            Fork::Paris,
            Fork::Shanghai,
            Fork::Cancun,
            Fork::Prague,
        ];
        for window in forks.windows(2) {
            assert!(window[0] < window[1]);
            assert!(window[1].is_activated(window[0]));
            assert!(!window[0].is_activated(window[1]));
        }
    }
}
