//! Data model for `arc_import`.
//!
//! - [`ImportBundle`] - the normalized output of every source format
//! - record types for requests, projects, history and the key/value entities

mod bundle;
mod records;

pub use bundle::{IMPORT_KIND, ImportBundle};
pub use records::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, EnvironmentRecord, HeaderSetRecord, HistoryRecord,
    MultipartItem, ParamItem, ProjectRecord, RequestRecord, RequestType, SimpleRecord,
    VariableRecord,
};
