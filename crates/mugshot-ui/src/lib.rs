#![warn(missing_docs)]
//! # mugshot-ui
//!
//! ## Purpose
//! Defines the UI-facing state model for the mugshot generator page.
//!
//! ## Responsibilities
//! - [`workflow`]: the upload/result state machine and every view flag it
//!   drives (preview, generate button, loading indicator, result surface,
//!   download button, queued alerts).
//! - [`chrome`]: page behavior unrelated to the workflow (menu, accordions,
//!   modals, reveal-on-scroll).
//!
//! ## Data flow
//! Orchestration events call transition methods on
//! [`workflow::WorkflowSession`]; a rendering shell reads the resulting
//! snapshot and drains alerts.
//!
//! ## Ownership and lifetimes
//! Sessions own all strings and buffers so that event reducers never borrow
//! from transient network data.
//!
//! ## Error model
//! Transitions do not fail. Rejected requests (generate without an upload,
//! or while a generation is running) are reported as
//! [`workflow::GenerateRejected`].

pub mod chrome;
pub mod workflow;

pub use chrome::{AccordionPanel, MENU_CLOSED_GLYPH, MENU_OPEN_GLYPH, PageChrome};
pub use workflow::{
    ButtonState, GenerateRejected, LoadingIndicator, RenderedResult, ResultSurface, UploadZone,
    WorkflowSession, WorkflowState,
};
