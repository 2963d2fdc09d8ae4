//! Edge Authz - Envoy callout that turns bearer tokens into identity headers.
//!
//! This crate provides one validation core (key loading, header extraction,
//! RS256 token validation) and two thin gRPC adapters over it: the ext_authz
//! `Check` RPC and the streaming ext_proc `Process` RPC.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authz;
pub mod config;
pub mod error;
pub mod grpc;
pub mod headers;
pub mod jwt;
pub mod keys;
pub mod observability;
pub mod shutdown;

/// Generated Envoy protobuf types and tonic stubs.
#[allow(
    clippy::all,
    clippy::pedantic,
    non_camel_case_types,
    unused_imports,
    missing_docs
)]
pub mod proto {
    pub mod envoy {
        pub mod config {
            pub mod core {
                pub mod v3 {
                    tonic::include_proto!("envoy.config.core.v3");
                }
            }
        }

        pub mod r#type {
            pub mod v3 {
                tonic::include_proto!("envoy.r#type.v3");
            }
        }

        pub mod service {
            pub mod auth {
                pub mod v3 {
                    tonic::include_proto!("envoy.service.auth.v3");
                }
            }

            pub mod ext_proc {
                pub mod v3 {
                    tonic::include_proto!("envoy.service.ext_proc.v3");
                }
            }
        }
    }

    pub mod google {
        pub mod rpc {
            tonic::include_proto!("google.rpc");
        }
    }
}

pub use authz::{Authorizer, Decision};
pub use config::Config;
pub use error::{AuthError, ErrorCode};
pub use grpc::{CheckService, ProcessService};
pub use jwt::TokenValidator;
pub use keys::VerificationKey;
