//! Binary container formats understood by the classifier.

pub mod macho;
