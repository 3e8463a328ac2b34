//! Game event definitions, catalogs, templates and execution.
//!
//! This crate holds the data model for externally triggered game events:
//! static event definitions authored as JSONC documents, parameterized
//! templates that are instantiated into concrete definitions, and the
//! executor that turns a definition's requests into HTTP calls against the
//! game's REST API. It contains no economy or chat logic; that lives in the
//! `rewards` crate.
//!
//! # Modules
//!
//! - [`definition`]: GameEvent, RequestSpec and document parsing
//! - [`notification`]: Notification options and wire headers
//! - [`loader`]: JSONC document loading
//! - [`catalog`]: Directory-backed repository and weighted random selection
//! - [`template`]: Parameter distributions, `$param` resolution, instantiation
//! - [`executor`]: Outbound HTTP execution against the game process

pub mod catalog;
pub mod definition;
pub mod executor;
pub mod loader;
pub mod notification;
pub mod template;

// Re-export definition types
pub use definition::{EventDocument, GameEvent, PayloadMode, RequestDocument, RequestSpec};

// Re-export notification types
pub use notification::{DeliveryMode, NotificationOptions};

// Re-export loader types
pub use loader::{load_document, strip_jsonc_comments, LoadError};

// Re-export catalog types
pub use catalog::{EventCatalog, EventEntry, EventRepository};

// Re-export template types
pub use template::{
    instantiate, instantiate_with_rng, instantiate_with_values, resolve, sample_distribution,
    sample_parameters, Distribution, EventTemplate, InstantiateError, RequestTemplate,
    ResolveError, SampleError, TemplateCatalog, TemplateEntry, TemplateParameter,
    TemplateRepository, WeightedValue,
};

// Re-export executor types
pub use executor::{
    coerce_scalar, summarize_body, EventExecutor, ExecutorError, RequestOutcome, RestClient,
};
