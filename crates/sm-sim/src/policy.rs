//! Matching policy selection.

use std::fmt;
use std::str::FromStr;

use crate::greedy::Selector;
use crate::SimError;

/// Which engine a [`Simulator`](crate::Simulator) drives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Policy {
    /// Score-based virtual-queue matching.
    #[default]
    VirtualQueue,
    /// Immediate matching with a queue-size tie-break.
    Greedy(Selector),
    /// Immediate matching that serves the oldest waiting items first.
    Fcfm,
}

impl Policy {
    /// Every available policy, in listing order.
    pub const ALL: [Policy; 5] = [
        Policy::VirtualQueue,
        Policy::Greedy(Selector::RandomNode),
        Policy::Greedy(Selector::LongestQueue),
        Policy::Greedy(Selector::RandomItem),
        Policy::Fcfm,
    ];

    /// Stable snake_case name, accepted back by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Policy::VirtualQueue                   => "virtual_queue",
            Policy::Greedy(Selector::RandomNode)   => "random_node",
            Policy::Greedy(Selector::LongestQueue) => "longest_queue",
            Policy::Greedy(Selector::RandomItem)   => "random_item",
            Policy::Fcfm                           => "fcfm",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| SimError::UnknownPolicy(s.to_owned()))
    }
}
