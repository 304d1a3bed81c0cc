//! The eight discrete actions a policy can take.

use serde::{Deserialize, Serialize};

use crate::domain::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hold,
    BuySmall,
    BuyMedium,
    BuyLarge,
    SellSmall,
    SellMedium,
    SellLarge,
    Close,
}

pub const SMALL_SIZE: f64 = 0.1;
pub const MEDIUM_SIZE: f64 = 0.25;
pub const LARGE_SIZE: f64 = 0.5;

impl Action {
    /// All actions in index order.
    pub const ALL: [Action; 8] = [
        Action::Hold,
        Action::BuySmall,
        Action::BuyMedium,
        Action::BuyLarge,
        Action::SellSmall,
        Action::SellMedium,
        Action::SellLarge,
        Action::Close,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        match self {
            Action::Hold => 0,
            Action::BuySmall => 1,
            Action::BuyMedium => 2,
            Action::BuyLarge => 3,
            Action::SellSmall => 4,
            Action::SellMedium => 5,
            Action::SellLarge => 6,
            Action::Close => 7,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// The directional signal this action feeds the tracker. HOLD and CLOSE map to HOLD.
    pub fn signal(&self) -> Signal {
        match self {
            Action::BuySmall | Action::BuyMedium | Action::BuyLarge => Signal::Buy,
            Action::SellSmall | Action::SellMedium | Action::SellLarge => Signal::Sell,
            Action::Hold | Action::Close => Signal::Hold,
        }
    }

    /// Position size for opening actions.
    pub fn size(&self) -> Option<f64> {
        match self {
            Action::BuySmall | Action::SellSmall => Some(SMALL_SIZE),
            Action::BuyMedium | Action::SellMedium => Some(MEDIUM_SIZE),
            Action::BuyLarge | Action::SellLarge => Some(LARGE_SIZE),
            Action::Hold | Action::Close => None,
        }
    }
}
