//! Export surfaces: thin serializers over a resolved AST and its
//! derived timeline. Each submodule owns one output format.

pub mod html;
pub mod ics;
pub mod json;
