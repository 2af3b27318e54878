#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod cdsvm;
pub mod eigen;
pub mod estimator;
pub mod jda;
pub mod kernel;
pub mod mmd;
pub mod qp;
pub mod refine;
pub mod svm;
pub mod tca;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures;

#[path = "../experiment/mod.rs"]
pub mod experiment;
