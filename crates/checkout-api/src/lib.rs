//! # checkout-api
//!
//! HTTP API layer for usdc-checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Solana Actions (blink) endpoints that build USDC purchase transactions
//! - Checkout page creation and lookup backed by Postgres
//! - Image uploads to Cloudinary and an Okto wallet proxy
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/actions.json` | Blink URL mapping |
//! | GET | `/api/actions/checkout/{id}` | Blink metadata |
//! | POST | `/api/actions/checkout/{id}` | Unsigned purchase transaction |
//! | POST | `/api/checkout-pages` | Create checkout page |
//! | GET | `/api/checkout-pages/{id}` | Get checkout page |
//! | POST | `/api/upload` | Upload an image |
//! | POST | `/api/authenticate` | Okto sign-in |
//! | POST | `/api/logout` | Okto sign-out |
//! | GET | `/api/portfolio` | Okto portfolio |

pub mod cloudinary;
pub mod db;
pub mod handlers;
pub mod okto;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
