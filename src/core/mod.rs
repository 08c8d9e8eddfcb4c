pub mod dispatcher;
pub mod entity_validation;
pub mod etl;
pub mod import_workflow;
pub mod intake;
pub mod mapping;
pub mod orientation;
pub mod time_domain;

pub use crate::domain::model::{ImportData, MappedImport, ParsedFile, RowMatrix, TimeValue};
pub use crate::domain::ports::{ConfigProvider, EntityValidator, ImportApi, Pipeline, Storage};
pub use crate::utils::error::Result;
