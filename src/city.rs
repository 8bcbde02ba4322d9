use std::{fmt, str::FromStr};

/// The two cities whose datasets are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    Berlin,
    Munich,
}

impl City {
    /// Fixed ingestion order.
    pub const ALL: [City; 2] = [City::Berlin, City::Munich];

    /// Literal stored in the `city` column.
    pub fn label(self) -> &'static str {
        match self {
            City::Berlin => "Berlin",
            City::Munich => "Munich",
        }
    }

    /// Token used in input file names, e.g. `listings_berlin.csv`.
    pub fn slug(self) -> &'static str {
        match self {
            City::Berlin => "berlin",
            City::Munich => "munich",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for City {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown city {s:?}"))
    }
}
