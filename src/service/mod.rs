//! Gateway services: detail loading, list shaping, masked-field reconciliation, write dispatch.

mod detail;
mod dispatch;
mod export;
mod list;
pub mod reconcile;

pub use detail::{DetailLoader, DetailView, RelatedData};
pub use dispatch::{
    CascadeInfo, DeleteOutcome, DeleteRequest, DispatchOutcome, DispatchStage, Dispatcher, ParentContext,
    WriteAction, WriteRequest,
};
pub use export::{export, ExportFile, ExportFormat};
pub use list::{allowed_query, load_list, ListView};
pub use reconcile::{count_masked, is_masked_placeholder, reconcile, Reconciled};
