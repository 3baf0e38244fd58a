pub(crate) mod ptype;
pub(crate) mod store;
