//! Core library for the Gariban flasher: the RDBOX user-data document
//! model, the wizard state machine that populates it, and the renderers
//! that turn it into cloud-init artifacts.

pub mod error;
pub mod flasher;
pub mod locale;
pub mod store;
pub mod userdata;
pub mod wizard;
