//! # Remodel
//!
//! > **A client-side data layer for REST resources.**
//!
//! Remodel keeps a typed, validated cache of the records behind a REST
//! endpoint and turns edits on that cache into `GET` / `POST` / `PUT` /
//! `DELETE` calls. Each resource gets one [`DomainStore`], which builds
//! [`Model`]s from responses, reconciles them into its cache, and tracks
//! loading and saving flags so a UI can render in-flight state.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. Schema ([`descriptor`], [`validate`], [`keys`])
//! - **Role**: Describes a resource's attributes and checks records against them.
//! - **Key items**: [`Descriptor`], [`AttributeSet`], [`validate_record`](validate::validate_record),
//!   [`KeyMap`](keys::KeyMap) (wire `snake_case` ⇄ local `camelCase`).
//!
//! ### 2. Records ([`model`], [`path`])
//! - **Role**: One record with dirty tracking, status flags and persistence through its owner.
//! - **Key items**: [`Model`], [`Resource`], [`RecordId`], [`ModelStatus`].
//!
//! ### 3. Orchestration ([`store`])
//! - **Role**: Cache plus CRUD orchestration with a uniform issue / transform / settle protocol.
//! - **Key items**: [`DomainStore`], [`Callbacks`], [`StoreOptions`].
//!
//! ### 4. Transport ([`api`], [`mock`])
//! - **Role**: Builds requests for one endpoint; the [`Transport`] trait is the seam to HTTP.
//! - **Key items**: [`ApiClient`], [`InMemoryBackend`](api::InMemoryBackend),
//!   [`MockTransport`](mock::MockTransport).
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each layer has its own error enum ([`DescriptorError`], [`ValidationError`],
//! [`ModelError`], [`ApiError`], [`StoreError`]); the outer ones wrap the
//! inner ones with `#[from]`, so callers can match on the exact failure.
//!
//! ### 2. Models Never Own Their Store
//! A model holds a weak [`StoreHandle`](store::StoreHandle) behind the
//! [`ModelOwner`](model::ModelOwner) trait. Dropping the store invalidates
//! its models instead of leaking it.
//!
//! ### 3. Observability
//! Operations run inside `tracing` spans with structured fields. See [`logging`].
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p remodel-sample
//! cargo test
//! ```

pub mod api;
pub mod descriptor;
pub mod error;
pub mod keys;
pub mod logging;
pub mod mock;
pub mod model;
pub mod path;
pub mod store;
pub mod validate;

/// A record as exchanged with the API: a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Query parameters of a read operation.
pub type Params = Record;

pub use api::{ApiClient, Transport, TransportConfig};
pub use descriptor::{AttributeSet, Descriptor, TypeTag};
pub use error::{ApiError, DescriptorError, ModelError, StoreError, TransportError, ValidationError};
pub use model::{Model, ModelStatus, RecordId, Resource};
pub use store::{Callbacks, DomainStore, StoreOptions};
