/*
 * UHT admin - tracked object and field selection
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
//! # uht-admin
//!
//! State engine behind an admin console for choosing which objects, and which
//! fields of those objects, are tracked for change history.
//!
//! ## Features
//!
//! - object list with per-object and per-field selection
//! - lazy field loading with a per-object cache, one expanded object at a time
//! - delta against the server baseline: only changes are submitted
//! - save and cancel, with a reload from the server after every save
//! - success, error, and info notifications through a pluggable [`Notifier`](notify::Notifier)
//! - http gateway with retry for idempotent requests, and an in-memory mock gateway
//!
//! ## Quick Start
//!
//! ```rust
//! use uht_admin::{mock::{MockGateway, object}, prelude::*};
//!
//! # async fn example() {
//! let gateway = MockGateway::new().with_objects(vec![
//!     object("Account", "Account", true, false),
//!     object("Contact", "Contact", false, false),
//! ]);
//! let notices = NotificationLog::new();
//! let mut console = Console::new(gateway, notices.clone());
//!
//! let task = console.load();
//! console.settle(task).await;
//! assert_eq!(console.summary(), "1 of 2");
//!
//! // checking an object expands it and fetches its fields
//! if let Some(task) = console.toggle_object_selection("Contact", true) {
//!     console.settle(task).await;
//! }
//! assert_eq!(console.delta().objects_to_activate, vec!["Contact".to_string()]);
//!
//! if let Some(task) = console.save() {
//!     console.settle(task).await;
//! }
//! assert_eq!(notices.pop().map(|n| n.title), Some("Success".to_string()));
//! # }
//! ```
//!
//! ## Driving the console
//!
//! Every user action is a synchronous method on [`Console`](console::Console). Actions
//! that need the gateway return a [`Task`](console::Task). Run it however the host
//! event loop likes and feed the resulting [`Outcome`](console::Outcome) back to
//! [`Console::apply`](console::Console::apply).
//!
//#![warn(clippy::pedantic)] // experimental
//#![warn(clippy::nursery)] // experimental
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::literal_string_with_formatting_args)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::ref_option)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod client;
pub mod console;
pub mod delta;
pub mod error;
pub mod expansion;
pub mod gateway;
pub mod http_client;
#[doc(hidden)]
pub mod mock;
pub mod model;
pub mod notify;
pub mod store;

/// Result type alias using `AdminError` as the default error.
pub type Result<T, E = crate::error::AdminError> = std::result::Result<T, E>;

/// Prelude module - import the common types with `use uht_admin::prelude::*;`
pub mod prelude {
    pub use super::config::DEFAULT_BASE_URL;
    // Error types
    pub use crate::error::{AdminError, ErrorClass};
    pub use crate::{
        // Configuration
        client::GatewayConfig,
        // Orchestration
        console::{Console, Outcome, SAVE_LABEL, SavePhase, Task},
        // Delta
        delta::{SelectionDelta, compute_delta},
        // Expansion
        expansion::Expansion,
        // Gateways
        gateway::Gateway,
        http_client::HttpGateway,
        // Object and field model
        model::{
            FieldInfo, FieldState, FieldType, ObjectInfo, SaveResult, TrackableField,
            TrackableObject,
        },
        // Notifications
        notify::{Notification, NotificationLog, Notifier, Variant},
        // Selection
        store::{SelectionStore, ToggleEffect},
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

pub mod config {
    /// Environment variable for the controller endpoint URL
    pub const UHT_URL_ENV: &str = "UHT_URL";

    /// Controller endpoint used when neither configuration nor `UHT_URL` provide one
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/uht";

    /// Per-request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Max retries for HTTP client
    pub const MAX_RETRIES: u32 = 3;
}
