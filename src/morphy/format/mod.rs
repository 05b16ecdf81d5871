//! File format parsing layer for the compiled dictionary files.
//!
//! Pure decoders: every function here takes bytes already fetched from a
//! [`ByteStore`](crate::morphy::storage::ByteStore) and returns typed records.
//!
//! # Module Organization
//!
//! - [`fsa`]: 60-byte automaton header and its validation
//! - [`annot`]: 15-byte dictionary and 16-byte prediction annotation records
//! - [`graminfo`]: grammatical-information file header and entry headers
//! - [`gramtab`]: the serialized part-of-speech/grammeme tables

pub mod annot;
pub mod fsa;
pub mod graminfo;
pub mod gramtab;
