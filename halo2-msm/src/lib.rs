#![allow(clippy::too_many_arguments)]
#![allow(clippy::op_ref)]
#![allow(clippy::type_complexity)]
#![deny(clippy::perf)]

// different memory allocator options:
// mimalloc is fastest on Mac M2
#[cfg(feature = "jemallocator")]
use jemallocator::Jemalloc;
#[cfg(feature = "jemallocator")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(all(feature = "jemallocator", feature = "mimalloc"))]
compile_error!(
    "Cannot have both \"jemallocator\" and \"mimalloc\" features enabled at the same time!"
);

pub mod config;
pub mod endo;
pub mod error;
pub mod msm;
pub mod utils;
pub mod wnaf;

pub mod bn254;

pub use config::MsmConfig;
pub use endo::{EndoParams, GlvCurve, SplitScalar};
pub use error::MsmError;
pub use msm::{
    generate_point_table, msm_safe, msm_safe_from_points, msm_unsafe, MsmContext, PointTable,
};

pub use ff;
pub use group;
pub use halo2curves;
