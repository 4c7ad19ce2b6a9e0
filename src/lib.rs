//! sodium-bridge - buffer-marshalling bridge for sodium-style primitives
//!
//! Exposes cryptographic primitives to a managed runtime whose byte buffers
//! come in two flavours: directly addressable native memory, and buffers
//! backed by managed arrays that must be pinned (copied out) and reconciled
//! afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  exports   extern "C" sodium_bridge_*  (handles, panic boundary)│
//! ├─────────────────────────────────────────────────────────────────┤
//! │  bindings  PrimitiveId ─► Signature + glue                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  adapter   Invoker / CallContext: resolve ─► call ─► release    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  resolver  BufferResolver: handle ─► BufferView (Direct|Pinned) │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  managed   ManagedRuntime trait     heap  reference runtime     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  sodium    hsalsa20, scalarmult, aead, crypto_box, randombytes, │
//! │            pwhash, scrypt                                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use sodium_bridge::{Invoker, ManagedHeap, PrimitiveId};
//!
//! assert!(sodium_bridge::init() == 0);
//!
//! let heap = ManagedHeap::new();
//! let q = heap.allocate_direct(32);
//! let backing = heap.new_array(&[9u8; 40]);
//! let n = heap.wrap(backing, 8, 32).unwrap();
//!
//! let status = Invoker::new(&heap)
//!     .call(PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), Some(&n)], &[])
//!     .unwrap();
//! assert_eq!(status, 0);
//! ```

#![warn(clippy::all)]

pub mod adapter;
pub mod bindings;
pub mod config;
pub mod error;
pub mod exports;
pub mod heap;
pub mod logging;
pub mod managed;
pub mod resolver;
pub mod sodium;
pub mod status;

pub use adapter::{Arg, CallContext, Frame, Invoker, Param, Role, Signature};
pub use bindings::PrimitiveId;
pub use config::{AbsentPolicy, BridgeConfig, ConfigError};
pub use error::{BridgeError, BridgeResult};
pub use heap::{Handle, HeapStats, ManagedHeap, ObjectKind, NULL_HANDLE};
pub use managed::{ManagedRuntime, NativeBlock, RawRegion};
pub use resolver::{AddressingMode, BufferResolver, BufferView};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the bridge.
///
/// Loads the configuration (once), installs logging when the configuration
/// enables it, and initializes the primitive library. Returns `0` on
/// success and `-1` on failure. Safe to call repeatedly.
pub fn init() -> i32 {
    let config = config::global();
    if config.logging.enabled {
        logging::init_logging(&config.logging.level, config.logging.format);
    }

    if sodium::init() < 0 {
        tracing::error!("primitive library failed to initialize");
        return status::FAILURE;
    }
    status::SUCCESS
}
