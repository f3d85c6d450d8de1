//! Activity label enumeration
//!
//! The classifier emits one probability per label, in the order declared here.
//! The order and spelling are shared with the model producer and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of labels the classifier distributes probability over
pub const LABEL_COUNT: usize = 15;

/// Activity predicted for a record or a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLabel {
    #[serde(rename = "TALKING")]
    Talking,
    #[serde(rename = "WITH_FRIENDS")]
    WithFriends,
    #[serde(rename = "EATING")]
    Eating,
    #[serde(rename = "WATCHING_TV")]
    WatchingTv,
    #[serde(rename = "IN_CLASS")]
    InClass,
    #[serde(rename = "IN_A_MEETING")]
    InAMeeting,
    #[serde(rename = "COOKING")]
    Cooking,
    #[serde(rename = "CLEANING")]
    Cleaning,
    #[serde(rename = "TOILET")]
    Toilet,
    #[serde(rename = "FIX_restaurant")]
    FixRestaurant,
    #[serde(rename = "SHOPPING")]
    Shopping,
    #[serde(rename = "WASHING_DISHES")]
    WashingDishes,
    #[serde(rename = "AT_THE_GYM")]
    AtTheGym,
    #[serde(rename = "DOING_LAUNDRY")]
    DoingLaundry,
    #[serde(rename = "ELEVATOR")]
    Elevator,
}

impl ActivityLabel {
    /// All labels in classifier output order
    pub const ALL: [ActivityLabel; LABEL_COUNT] = [
        ActivityLabel::Talking,
        ActivityLabel::WithFriends,
        ActivityLabel::Eating,
        ActivityLabel::WatchingTv,
        ActivityLabel::InClass,
        ActivityLabel::InAMeeting,
        ActivityLabel::Cooking,
        ActivityLabel::Cleaning,
        ActivityLabel::Toilet,
        ActivityLabel::FixRestaurant,
        ActivityLabel::Shopping,
        ActivityLabel::WashingDishes,
        ActivityLabel::AtTheGym,
        ActivityLabel::DoingLaundry,
        ActivityLabel::Elevator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Talking => "TALKING",
            ActivityLabel::WithFriends => "WITH_FRIENDS",
            ActivityLabel::Eating => "EATING",
            ActivityLabel::WatchingTv => "WATCHING_TV",
            ActivityLabel::InClass => "IN_CLASS",
            ActivityLabel::InAMeeting => "IN_A_MEETING",
            ActivityLabel::Cooking => "COOKING",
            ActivityLabel::Cleaning => "CLEANING",
            ActivityLabel::Toilet => "TOILET",
            ActivityLabel::FixRestaurant => "FIX_restaurant",
            ActivityLabel::Shopping => "SHOPPING",
            ActivityLabel::WashingDishes => "WASHING_DISHES",
            ActivityLabel::AtTheGym => "AT_THE_GYM",
            ActivityLabel::DoingLaundry => "DOING_LAUNDRY",
            ActivityLabel::Elevator => "ELEVATOR",
        }
    }

    /// Position of this label in the classifier output
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|label| label.as_str() == name)
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
