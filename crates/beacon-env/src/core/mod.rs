pub use self::{action::*, feature_layer::*, point::*};

pub(crate) mod action;
pub(crate) mod feature_layer;
pub(crate) mod point;
