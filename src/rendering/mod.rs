//! Rendering resource descriptors.
//!
//! - [`ShaderProgram`] - shader sources, depth mode and parameter layouts
//! - [`Material`] - shader binding, colour, texture and blending

mod material;
mod shader;

pub use material::*;
pub use shader::*;
