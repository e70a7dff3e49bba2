//! Object-type filter.
//!
//! Re-discovery is the most expensive step of a filter request, so it only
//! runs when the effective object-type selection changes. Threshold-only
//! changes reuse the cached artifact as is.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::pipeline::adapter::discover_both;
use crate::traits::miner::{EventLog, LogMiner};
use crate::types::graph::ObjectCentricGraph;
use crate::types::log::LogSummary;
use crate::types::petri::PetriNet;

/// Outcome of comparing a requested selection with the cached one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilterDecision {
    /// Effective selection; `None` means the full log
    pub selection: Option<BTreeSet<String>>,
    pub needs_rediscovery: bool,
}

/// Normalize a requested selection against the log's object types.
///
/// `None`, an empty set and the full set all mean "no filtering". Names the
/// log does not contain are rejected.
pub fn resolve_selection(
    requested: Option<&BTreeSet<String>>,
    available: &BTreeSet<String>,
) -> Result<Option<BTreeSet<String>>> {
    let Some(requested) = requested.filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    let unknown: Vec<String> = requested.difference(available).cloned().collect();
    if !unknown.is_empty() {
        return Err(EngineError::InvalidObjectTypes { unknown });
    }

    if requested == available {
        Ok(None)
    } else {
        Ok(Some(requested.clone()))
    }
}

/// Decide whether a request needs re-discovery.
///
/// `previous` is the selection the cached structures were discovered for.
/// Comparison is by set, so order and duplicates in the request are
/// irrelevant.
pub fn apply_type_filter(
    previous: Option<&BTreeSet<String>>,
    requested: Option<&BTreeSet<String>>,
    available: &BTreeSet<String>,
) -> Result<TypeFilterDecision> {
    let selection = resolve_selection(requested, available)?;
    let needs_rediscovery = selection.as_ref() != previous;
    debug!(
        previous = ?previous,
        selection = ?selection,
        needs_rediscovery,
        "Resolved object-type selection"
    );
    Ok(TypeFilterDecision {
        selection,
        needs_rediscovery,
    })
}

/// Structures discovered for one selection.
#[derive(Debug, Clone)]
pub struct Rediscovery {
    pub summary: LogSummary,
    pub graph: ObjectCentricGraph,
    pub petri_net: PetriNet,
}

/// Subset `log` to `selection` (when given) and discover both models.
pub fn rediscover<M: LogMiner>(
    miner: &M,
    log: &M::Log,
    selection: Option<&BTreeSet<String>>,
) -> Result<Rediscovery> {
    let subset;
    let log = match selection {
        Some(types) => {
            subset = miner.subset_by_object_types(log, types)?;
            &subset
        }
        None => log,
    };

    let (graph, petri_net) = discover_both(miner, log)?;
    Ok(Rediscovery {
        summary: log.summary(),
        graph,
        petri_net,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn absent_or_empty_selection_means_full_log() {
        let available = set(&["order", "item"]);
        assert_eq!(resolve_selection(None, &available).unwrap(), None);
        assert_eq!(resolve_selection(Some(&set(&[])), &available).unwrap(), None);
    }

    #[test]
    fn full_set_is_the_same_as_no_selection() {
        let available = set(&["order", "item"]);
        let decision = apply_type_filter(None, Some(&set(&["item", "order"])), &available).unwrap();
        assert_eq!(decision.selection, None);
        assert!(!decision.needs_rediscovery);
    }

    #[test]
    fn changed_selection_needs_rediscovery() {
        let available = set(&["order", "item", "package"]);
        let decision = apply_type_filter(None, Some(&set(&["order"])), &available).unwrap();
        assert_eq!(decision.selection, Some(set(&["order"])));
        assert!(decision.needs_rediscovery);

        let previous = set(&["order"]);
        let decision =
            apply_type_filter(Some(&previous), Some(&set(&["order"])), &available).unwrap();
        assert!(!decision.needs_rediscovery);

        let decision = apply_type_filter(Some(&previous), None, &available).unwrap();
        assert!(decision.needs_rediscovery);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let available = set(&["order"]);
        let err = resolve_selection(Some(&set(&["order", "ghost"])), &available).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObjectTypes { ref unknown } if unknown == &["ghost"]));
    }
}
