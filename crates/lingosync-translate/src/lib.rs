//! Translation gateway and text-limit rules for lingosync.
//!
//! This crate provides the pieces of the sync pipeline that shape text:
//! the target-locale catalog, locale-code to language-name resolution,
//! the length-limit transforms the store enforces, and the [`Translator`]
//! seam with its provider-backed implementation.

pub mod catalog;
pub mod locale;
pub mod translator;
pub mod truncate;

pub use catalog::{default_catalog, TargetLocale};
pub use locale::language_name_for;
pub use translator::{OpenAiTranslator, Translator};
pub use truncate::{truncate_app_info_text, truncate_keywords, APP_INFO_TEXT_LIMIT};
