/*!
 * Incremental translation of document text units.
 *
 * This module holds everything that does not depend on a particular
 * document format:
 *
 * - `document`: text units, translation maps and structural reports
 * - `dedup`: duplicate consolidation and propagation
 * - `cache`: per-document metadata cache
 * - `client`: chunked, retrying client over a translation backend
 * - `pipeline`: the extract → diff → translate → apply orchestrator
 */

pub use self::cache::{DocumentMetadata, MetadataCache, TranslationCacheEntry};
pub use self::client::{ClientSettings, RetryPolicy, TranslationClient};
pub use self::document::{ApplyReport, MessagePart, StructuralReport, TextUnit, TranslationMap, UnitKind};
pub use self::pipeline::{DocumentFormat, Extraction, Pipeline, ProgressSink, RunSummary};

pub mod cache;
pub mod client;
pub mod dedup;
pub mod document;
pub mod pipeline;
