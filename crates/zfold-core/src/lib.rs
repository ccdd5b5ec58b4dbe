pub mod consts;
pub mod error;
pub mod io;
pub mod kinetics;
pub mod pipeline;
pub mod plane;
pub mod project;
pub mod region;
pub mod source;
