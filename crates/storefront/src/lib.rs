//! QuickCart storefront library.
//!
//! Server-rendered storefront over the dummyjson catalog API. Each browser
//! session gets its own cart, cart-panel state, category strip scroll
//! position and add-to-cart animations, all held in memory.
//!
//! The binary in `main.rs` adds Sentry and the tracing subscriber on top of
//! [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod feedback;
pub mod middleware;
pub mod routes;
pub mod shopper;
pub mod state;
