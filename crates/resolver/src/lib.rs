//! Response resolution: the heart of DigiBuddy.
//!
//! Every reply goes through the same short-circuiting pass:
//!
//! 1. **Exact** knowledge-base hit
//! 2. **Fuzzy** knowledge-base hit
//! 3. **Delegate** to the language model with an assembled context
//! 4. **Fallback** to a static reply if delegation fails
//!
//! [`ResponseResolver::resolve`] never returns an error: a provider failure
//! becomes a degraded result carrying the fallback text.

pub mod context;
pub mod fallback;
pub mod resolver;

pub use context::{ContextAssembler, HistoryWindow};
pub use fallback::render_fallback;
pub use resolver::{ResolutionResult, ResolutionSource, ResponseResolver, load_knowledge};
