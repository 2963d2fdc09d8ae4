//! gRPC Service Implementation
//!
//! Two Envoy callout protocols over one [`Authorizer`](crate::authz::Authorizer):
//! the unary ext_authz `Check` and the streaming ext_proc `Process`.

pub mod check;
pub mod process;
pub mod response;

pub use check::CheckService;
pub use process::{EventKind, ExchangePhase, ProcessService};

use crate::headers::{HeaderCollection, HeaderField};
use crate::proto::envoy::config::core::v3::HeaderMap;

impl HeaderCollection for HeaderMap {
    fn header_fields(&self) -> impl Iterator<Item = HeaderField<'_>> {
        self.headers.iter().map(|header| HeaderField {
            key: &header.key,
            value: &header.value,
            raw_value: &header.raw_value,
        })
    }
}
