use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A row of the client registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Raw row returned by the similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ClientCandidate {
    pub name: String,
    pub similarity: f32,
}

/// A canonical client chosen for a hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientMatch {
    pub name: String,
    pub similarity: f32,
    pub exact: bool,
}

/// Normalized outcome of a registry lookup.
///
/// Every lookup path (exact match, similarity search) funnels its raw rows
/// through [`ClientLookup::from_candidates`] so callers match on one shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientLookup {
    NoMatch,
    Match(ClientMatch),
}

impl ClientLookup {
    /// Picks the best candidate strictly above `threshold`.
    ///
    /// A candidate whose name equals the hint case-insensitively wins outright.
    /// Otherwise the highest similarity strictly above the threshold is taken;
    /// ties keep the first row. Blank names and non-finite scores are ignored.
    pub fn from_candidates(hint: &str, candidates: Vec<ClientCandidate>, threshold: f32) -> Self {
        let hint = hint.trim();
        let usable = candidates
            .into_iter()
            .filter(|c| !c.name.trim().is_empty() && c.similarity.is_finite());

        let mut best: Option<ClientCandidate> = None;
        for candidate in usable {
            if candidate.name.trim().eq_ignore_ascii_case(hint) {
                return ClientLookup::Match(ClientMatch {
                    name: candidate.name,
                    similarity: 1.0,
                    exact: true,
                });
            }
            if candidate.similarity <= threshold {
                continue;
            }
            match &best {
                Some(current) if current.similarity >= candidate.similarity => {}
                _ => best = Some(candidate),
            }
        }

        match best {
            Some(candidate) => ClientLookup::Match(ClientMatch {
                name: candidate.name,
                similarity: candidate.similarity,
                exact: false,
            }),
            None => ClientLookup::NoMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, similarity: f32) -> ClientCandidate {
        ClientCandidate {
            name: name.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_empty_candidates_is_no_match() {
        assert_eq!(
            ClientLookup::from_candidates("sally", vec![], 0.6),
            ClientLookup::NoMatch
        );
    }

    #[test]
    fn test_exact_case_insensitive_match_wins() {
        let lookup = ClientLookup::from_candidates(
            "SALLY",
            vec![candidate("Sallie Mae", 0.9), candidate("sally", 0.7)],
            0.6,
        );
        match lookup {
            ClientLookup::Match(m) => {
                assert_eq!(m.name, "sally");
                assert!(m.exact);
            }
            ClientLookup::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_highest_similarity_above_threshold() {
        let lookup = ClientLookup::from_candidates(
            "jon smith",
            vec![
                candidate("John Smith", 0.72),
                candidate("Jon Smithers", 0.81),
                candidate("Joan Smit", 0.4),
            ],
            0.6,
        );
        assert_eq!(
            lookup,
            ClientLookup::Match(ClientMatch {
                name: "Jon Smithers".to_string(),
                similarity: 0.81,
                exact: false,
            })
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let lookup = ClientLookup::from_candidates("abc", vec![candidate("abd", 0.6)], 0.6);
        assert_eq!(lookup, ClientLookup::NoMatch);
    }

    #[test]
    fn test_ignores_blank_and_nan_rows() {
        let lookup = ClientLookup::from_candidates(
            "x",
            vec![candidate("  ", 0.99), candidate("xy", f32::NAN)],
            0.6,
        );
        assert_eq!(lookup, ClientLookup::NoMatch);
    }
}
