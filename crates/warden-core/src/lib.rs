#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod crypto;

pub use crypto::{CryptoError, CryptoResult, EncryptionKey, EncryptionScheme};
