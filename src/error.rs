//! Command-line Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    /// The names file could not be read or does not describe a batch.
    #[display("invalid names file {}: {_1}", _0.display())]
    Names(#[error(not(source))] PathBuf, #[error(not(source))] String),
    #[display("invalid coordinate")]
    Coordinate,
    #[display("cannot rename files in {}", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    #[display("lookup service could not be set up")]
    Lookup,
    #[display("label cache could not be saved")]
    Cache,
    #[display("could not write output")]
    Output,
}
