/*!
 * Per-pass diagnostic reports.
 *
 * Traversals return these instead of bumping shared counters; the caller
 * aggregates them and decides what to log.
 */

use log::{debug, warn};

use crate::errors::StructuralAccessWarning;

// Individual entries logged before switching to a single summary line
const LOGGED_ENTRIES: usize = 5;

/// Sub-trees skipped during a traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralReport {
    pub warnings: Vec<StructuralAccessWarning>,
}

impl StructuralReport {
    pub fn warn(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.warnings.push(StructuralAccessWarning::new(location, reason));
    }

    pub fn merge(&mut self, other: StructuralReport) {
        self.warnings.extend(other.warnings);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Log the first few warnings and a count for the rest
    pub fn log(&self, document: &str) {
        for warning in self.warnings.iter().take(LOGGED_ENTRIES) {
            warn!("Skipped part of {}: {}", document, warning);
        }
        if self.warnings.len() > LOGGED_ENTRIES {
            warn!(
                "... {} more structural warnings in {}",
                self.warnings.len() - LOGGED_ENTRIES,
                document
            );
        }
    }
}

/// Outcome of applying a translation map to a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Nodes rewritten with a translation
    pub applied: usize,

    /// Matched nodes left alone because they already hold target-language text
    pub already_translated: usize,

    /// Ids of source-language nodes with no translation available
    pub missed: Vec<String>,

    /// Sub-trees the applier could not walk
    pub structural: StructuralReport,
}

impl ApplyReport {
    pub fn record_applied(&mut self) {
        self.applied += 1;
    }

    pub fn record_already_translated(&mut self) {
        self.already_translated += 1;
    }

    pub fn record_miss(&mut self, id: impl Into<String>) {
        self.missed.push(id.into());
    }

    pub fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.already_translated += other.already_translated;
        self.missed.extend(other.missed);
        self.structural.merge(other.structural);
    }

    /// Log the outcome in aggregate, never one line per node
    pub fn log(&self, document: &str) {
        debug!(
            "Applied {} translations to {} ({} already translated)",
            self.applied, document, self.already_translated
        );

        for id in self.missed.iter().take(LOGGED_ENTRIES) {
            debug!("No translation matched node {} in {}", id, document);
        }
        if !self.missed.is_empty() {
            warn!(
                "{} source-language nodes in {} had no matching translation",
                self.missed.len(),
                document
            );
        }

        self.structural.log(document);
    }
}
