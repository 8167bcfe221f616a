//! LLM provider implementations for DigiBuddy.
//!
//! All providers implement the `digibuddy_core::Provider` trait.
//! [`build_from_config`] picks and configures the one named in `AppConfig`.

pub mod factory;
pub mod openai_compat;

pub use factory::build_from_config;
pub use openai_compat::OpenAiCompatProvider;
