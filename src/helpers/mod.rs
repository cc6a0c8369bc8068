//! Low-level archive and XML plumbing shared by the workbook readers.
pub(crate) mod xml;
pub(crate) mod zip;
