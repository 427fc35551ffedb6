pub(crate) mod export;
pub(crate) mod review;
pub(crate) mod scoring;
pub(crate) mod submission;
pub(crate) mod uploads;
