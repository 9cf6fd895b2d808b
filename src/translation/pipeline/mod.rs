/*!
 * Translation pipeline shared by every document format.
 *
 * - `orchestrator`: the generic extract → diff → translate → apply run
 * - `progress`: progress sinks and the monotonic wrapper
 */

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{DocumentFormat, Extraction, Pipeline, RunSummary};
pub use progress::{MonotonicProgress, NoopProgress, ProgressSink, RecordingProgress};
