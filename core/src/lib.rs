//! Client core for the persons API: HTTP adapter plus resource store.
//!
//! # Overview
//! Two layers over one small remote API. `ApiClient` is the only component
//! that performs network calls; it exposes one operation per endpoint and
//! funnels every round-trip through a single logging chokepoint.
//! `PersonStore` sits on top: an in-memory person collection with `loading`
//! and `error` flags, CRUD actions that reconcile local state with the
//! server's responses, and change notifications for observers.
//!
//! # Design
//! - Requests and responses are plain data; the `Transport` trait is the
//!   only seam to the network, so tests script responses in memory.
//! - Stores and clients are plain values handed to whoever needs them,
//!   never globals.
//! - Fetch failures are recorded in state but not returned; mutation
//!   failures are both recorded and re-raised.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod store;
pub mod types;

pub use client::{ApiClient, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use store::{CollectionState, PersonStore};
pub use types::{Message, Person, PersonInput};
