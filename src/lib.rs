/*!
 * # jatoko - incremental Japanese to Korean translation of diagrams and SVGs
 *
 * A Rust library that translates the text of UML diagram models
 * (`*.uml.json`) and SVG files without destroying the original.
 *
 * ## Features
 *
 * - Extract translatable text with ids that survive a reload of the document
 * - Reuse translations cached next to each document (`<file>.meta.json`)
 * - Translate identical strings once
 * - Chunked, retrying calls to DeepL
 * - Keep the original text reachable: `"原文 / 번역"` labels in diagrams,
 *   hover overlays in SVGs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: the format-independent pipeline:
 *   - `translation::document`: text units, translation maps and reports
 *   - `translation::dedup`: duplicate consolidation
 *   - `translation::cache`: per-document translation metadata
 *   - `translation::client`: chunking and retry around a backend
 *   - `translation::pipeline`: the orchestrator and progress reporting
 * - `diagram`: diagram projects, their store and per-diagram handlers
 * - `svg`: SVG DOM, extraction and overlay rewrite
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language codes and script detection
 * - `providers`: translation service backends (DeepL, mock)
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod diagram;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod svg;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, PipelineError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t, Script};
pub use translation::{Pipeline, RunSummary, TextUnit};
