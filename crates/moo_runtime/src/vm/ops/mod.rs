//! VM operation implementations.

pub(crate) mod access;
pub(crate) mod call;
pub(crate) mod collection;
pub(crate) mod compare;
pub(crate) mod data;
pub(crate) mod flow;
pub(crate) mod guard;
pub(crate) mod iter;
pub(crate) mod math;
pub(crate) mod scatter;
