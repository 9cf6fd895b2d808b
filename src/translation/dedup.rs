/*!
 * Duplicate text consolidation.
 *
 * Units with identical original text are translated once: the first unit of
 * each group is the representative, later ones point back at it and copy its
 * translation once it is known.
 */

use std::collections::HashMap;

use log::debug;

use super::document::TextUnit;

/// Summary of a consolidation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Groups with more than one member
    pub groups: usize,
    /// Units marked as duplicates
    pub duplicates: usize,
}

/// Group units by exact original text and mark every non-first member.
///
/// Existing marks are cleared first, so running this twice gives the same result.
pub fn consolidate(units: &mut [TextUnit]) -> DedupStats {
    let mut representatives: HashMap<String, usize> = HashMap::new();
    let mut group_sizes: HashMap<usize, usize> = HashMap::new();
    let mut stats = DedupStats::default();

    for index in 0..units.len() {
        units[index].duplicate_of = None;

        match representatives.get(&units[index].original_text) {
            Some(&rep) => {
                units[index].duplicate_of = Some(units[rep].id.clone());
                *group_sizes.entry(rep).or_insert(1) += 1;
                stats.duplicates += 1;
            }
            None => {
                representatives.insert(units[index].original_text.clone(), index);
            }
        }
    }

    stats.groups = group_sizes.len();
    if stats.duplicates > 0 {
        debug!(
            "Consolidated {} duplicate texts into {} groups",
            stats.duplicates, stats.groups
        );
    }
    stats
}

/// Copy each representative's translation onto the members of its group.
///
/// Returns the number of units that received a translation.
pub fn propagate(units: &mut [TextUnit]) -> usize {
    let translations: HashMap<String, String> = units
        .iter()
        .filter(|unit| !unit.is_duplicate())
        .filter_map(|unit| {
            unit.translated_text
                .as_ref()
                .map(|text| (unit.id.clone(), text.clone()))
        })
        .collect();

    let mut propagated = 0;
    for unit in units.iter_mut() {
        let Some(rep_id) = unit.duplicate_of.as_ref() else {
            continue;
        };
        if let Some(text) = translations.get(rep_id) {
            unit.translated_text = Some(text.clone());
            propagated += 1;
        }
    }
    propagated
}
