use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// San Diego Zoo area
pub const ZOO_CENTER: LatLng = LatLng::new(32.7353, -117.1490);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Restaurant {
    pub fn new(id: &str, name: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

pub fn seed_restaurants() -> Vec<Restaurant> {
    vec![
        Restaurant::new("rst-1", "Safari Bites", 32.7359, -117.1498),
        Restaurant::new("rst-2", "Elephant Grounds", 32.7351, -117.1509),
        Restaurant::new("rst-3", "Penguin Scoop", 32.7345, -117.1482),
        Restaurant::new("rst-4", "Giraffe Grill", 32.7362, -117.1477),
        Restaurant::new("rst-5", "Waffle Warden", 32.7349, -117.1466),
    ]
}

/// Rating dimension. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(rename = "ice cream")]
    IceCream,
    Coffee,
    Casserole,
    Waffle,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::IceCream,
        Category::Coffee,
        Category::Casserole,
        Category::Waffle,
        Category::Other,
    ];

    /// Label used both in persisted JSON and in the popup markup.
    pub fn label(self) -> &'static str {
        match self {
            Self::IceCream => "ice cream",
            Self::Coffee => "coffee",
            Self::Casserole => "casserole",
            Self::Waffle => "waffle",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown category {s:?}"))
    }
}
