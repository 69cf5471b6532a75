//! CASI (Casto Assistance and Support Intelligence) answer-routing backend.
//!
//! A turn enters through [`comms`], is classified by [`intent`], and is
//! answered by the [`router`] ladder from the [`knowledge`] store, the
//! company websites ([`web`]), web [`search`], or the [`llm`], in that
//! priority order. [`compose`] shapes the final reply and [`conversation`]
//! keeps per-user context between turns.

pub mod bootstrap;
pub mod comms;
pub mod compose;
pub mod config;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod intent;
pub mod knowledge;
pub mod llm;
pub mod router;
pub mod search;
pub mod web;
