pub mod authors;
pub mod config;
pub mod identifiers;
pub mod linker;
pub mod markers;
pub mod metadata;
pub mod pipeline;
pub mod section;
pub mod style;
pub mod text_processing;
pub mod title;

pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use linker::{CitationLinker, build_definition_index, link};
pub use metadata::{ExtractionContext, MetadataExtractor, extract};
pub use pipeline::{DocumentProcessor, ProcessedDocument};
pub use section::{find_reference_heading, front_matter, parse_headings, segment_entries};
pub use style::{Signals, detect_signals, recommend_style, recommend_style_with_thresholds, style_alignment};
pub use text_processing::normalize;
pub use title::{TitleCandidate, TitleSource};
