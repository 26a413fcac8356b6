pub mod da;
pub mod wire;

#[cfg(feature = "testutils")]
pub mod testutils;

/// Opaque error carried through from external collaborators.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
