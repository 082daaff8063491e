pub(crate) mod bundle;
pub(crate) mod common;
pub(crate) mod content;
pub(crate) mod credentials;
pub(crate) mod stages;
