pub(crate) mod estimator;
pub(crate) mod field;
pub(crate) mod inverse_search;
pub(crate) mod lucas_kanade;
pub(crate) mod pyramid;
