use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A registry entry. Identity, equality and ordering come from `id` alone, compared
/// byte-wise, so `"085..."` sorts after `"061..."` regardless of the other fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Citizen {
    pub id: String,
    pub name: String,
    pub sex: String,
    pub birth_date: NaiveDate,
}

impl Citizen {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sex: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex: sex.into(),
            birth_date,
        }
    }

    /// Lookup placeholder carrying only an id.
    pub fn key(id: impl Into<String>) -> Self {
        Self::new(id, "", "", NaiveDate::default())
    }
}

impl PartialEq for Citizen {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Citizen {}

impl PartialOrd for Citizen {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Citizen {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.as_bytes().cmp(other.id.as_bytes())
    }
}

impl fmt::Display for Citizen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ID: {}] {} - {} - {}",
            self.id,
            self.name,
            self.sex,
            self.birth_date.format("%d/%m/%Y")
        )
    }
}

/// Synthetic workload of `count` citizens with 12-digit ids. Sorted ids run
/// `000000000001..`; random ids are drawn from `1..999_999_999` and may repeat.
pub fn generate(count: usize, sorted: bool) -> Vec<Citizen> {
    let mut rng = rand::thread_rng();
    let born = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    (0..count)
        .map(|i| {
            let n = if sorted {
                i as u64 + 1
            } else {
                rng.gen_range(1..999_999_999u64)
            };
            Citizen::new(format!("{n:012}"), format!("User {i}"), "M", born)
        })
        .collect()
}
