/*!
 * Text-unit model shared by every document format.
 *
 * - `model`: `TextUnit`, `UnitKind` and the id → translation lookup
 * - `report`: diagnostic reports returned by extraction and application passes
 */

pub mod model;
pub mod report;

pub use model::{structural_hash, ElementKind, MessagePart, TextUnit, TranslationMap, UnitKind};
pub use report::{ApplyReport, StructuralReport};
