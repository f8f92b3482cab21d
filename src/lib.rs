pub mod api;
pub mod boolean;
pub mod config;
pub mod error;
pub mod ingest;
pub mod load;
pub mod store;

pub use boolean::{BooleanParser, BooleanVocabulary, UnrecognizedBoolean};
pub use error::{LoadError, RowViolation};
pub use ingest::RawRow;
pub use load::{CommitMode, DiagnosticPolicy, LoadOptions, LoadSummary, Loader, RaggedRows};
pub use store::{BusinessSymptomRecord, Database, NewBusinessSymptom, StoreError, SymptomStore};
