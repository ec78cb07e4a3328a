// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - SFMC sync logic.

pub mod payload;
pub mod sfmc;
pub mod sync;
pub mod token;

pub use payload::PayloadBuilder;
pub use sfmc::{SfmcClient, SfmcError, TokenResponse};
pub use sync::{BatchReport, PendingSummary, SkipReason, SyncFailure, SyncOrchestrator, SyncOutcome};
pub use token::TokenCache;
