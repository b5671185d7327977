//! Infrastructure layer: fetching, parsing, notification and process setup
//!
//! Everything that touches the network, the document format or the process
//! environment lives here. The domain layer stays free of I/O.

pub mod config;
pub mod http_client;
pub mod logging;
pub mod notifier;
pub mod parsing;

pub use config::{AppConfig, ConfigError, LoggingConfig, ScheduleConfig};
pub use http_client::{
    DocumentSource, FetchError, FetchErrorKind, HttpClient, HttpClientConfig, RawDocument,
};
pub use logging::init_logging_with_config;
pub use notifier::{
    LogNotifier, Notifier, NotifierConfig, NotifyError, WebhookNotifier, build_notifier,
};
pub use parsing::{
    EmbeddedDataExtractor, ExtractionConfig, ExtractionError, KeywordFallbackExtractor,
    PageContext, SignalExtractor, StructuralMarkerExtractor,
};
