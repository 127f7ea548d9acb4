//! Client library for remote nanofabrication prediction and correction of
//! photonic device layouts.
//!
//! A [`Device`] wraps the planar geometry of a design. Local operations
//! prepare it (binarization, blurring, morphology, padding); the remote
//! calls ([`Device::predict`], [`Device::correct`], [`Device::semulate`])
//! submit it to a hosted model from the [`models`] registry and hand back
//! the service's estimate of the fabricated geometry. Accounts are linked
//! once with `prefab setup`.

pub mod batch;
pub mod client;
pub mod codec;
pub mod credentials;
pub mod device;
pub mod errors;
pub mod export;
pub mod geometry;
pub mod models;
pub mod setup;

pub use batch::{predict_batch, BatchOptions};
pub use client::{ModelKind, PredictRequest, PredictionClient};
pub use credentials::TokenSet;
pub use device::{BufferMode, BufferSpec, Device, PredictOptions};
pub use models::Model;
