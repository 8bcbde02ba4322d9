use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

const BUILTIN: &str = include_str!("../../config/downtown.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Downtown,
    Outside,
    /// The city has no entry in the table.
    UnknownCity,
}

impl Location {
    /// Listings in unrecognized cities count as non-downtown.
    pub fn is_downtown(self) -> bool {
        matches!(self, Location::Downtown)
    }
}

/// Downtown neighbourhood allow-list, keyed by city label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DowntownTable {
    by_city: BTreeMap<String, BTreeSet<String>>,
}

impl DowntownTable {
    /// The table shipped in `config/downtown.yaml`.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN).context("parsing built-in downtown table")
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// `path` when given, the built-in table otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::builtin(),
        }
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.by_city.keys().map(String::as_str)
    }

    pub fn classify(&self, city: Option<&str>, neighbourhood: Option<&str>) -> Location {
        let Some(districts) = city.and_then(|c| self.by_city.get(c)) else {
            return Location::UnknownCity;
        };
        match neighbourhood {
            Some(n) if districts.contains(n) => Location::Downtown,
            _ => Location::Outside,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_table_classifies_known_districts() {
        let table = DowntownTable::builtin().unwrap();
        assert_eq!(table.cities().collect::<Vec<_>>(), vec!["Berlin", "Munich"]);

        assert_eq!(table.classify(Some("Berlin"), Some("Mitte")), Location::Downtown);
        assert_eq!(table.classify(Some("Berlin"), Some("Neukölln")), Location::Outside);
        assert_eq!(
            table.classify(Some("Munich"), Some("Altstadt-Lehel")),
            Location::Downtown
        );
        // district lists are per city
        assert_eq!(table.classify(Some("Munich"), Some("Mitte")), Location::Outside);
        assert_eq!(table.classify(Some("Berlin"), None), Location::Outside);
    }

    #[test]
    fn unknown_city_is_reported_and_not_downtown() {
        let table = DowntownTable::builtin().unwrap();
        let loc = table.classify(Some("Hamburg"), Some("Mitte"));
        assert_eq!(loc, Location::UnknownCity);
        assert!(!loc.is_downtown());
        assert_eq!(table.classify(None, Some("Mitte")), Location::UnknownCity);
    }

    #[test]
    fn loads_override_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Hamburg:\n  - Altona\n").unwrap();
        let table = DowntownTable::load(Some(f.path())).unwrap();
        assert_eq!(table.classify(Some("Hamburg"), Some("Altona")), Location::Downtown);
        assert_eq!(table.classify(Some("Berlin"), Some("Mitte")), Location::UnknownCity);
    }
}
