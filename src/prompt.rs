//! Prompt construction for changelog summaries
//!
//! The summary request is made of a fixed system instruction and a user
//! prompt that embeds the changelog bullet list.

use crate::error::{ReleaseError, Result};

/// Default maximum allowed prompt size in bytes (1MB)
pub const DEFAULT_MAX_PROMPT_SIZE: usize = 1_000_000;

/// System instruction sent with every summary request
pub const SYSTEM_INSTRUCTION: &str = "You are an assistant that writes a 2-3 sentence summary \
     of a software release from its list of changes.";

const PROMPT_HEADER: &str = "Here is the list of changes:\n";
const PROMPT_FOOTER: &str = "\n\nWrite a short summary.";

/// Build the user prompt for a bullet list
///
/// The final prompt structure is:
/// ```text
/// Here is the list of changes:
/// {bullets}
///
/// Write a short summary.
/// ```
///
/// # Errors
///
/// * Combined prompt size exceeds `max_size` (reported as a summary error)
///
/// # Example
///
/// ```
/// use commit_release::prompt::{build_summary_prompt, DEFAULT_MAX_PROMPT_SIZE};
///
/// let prompt = build_summary_prompt("- fix: crash (abcdef1) by @alice", DEFAULT_MAX_PROMPT_SIZE).unwrap();
/// assert!(prompt.contains("- fix: crash (abcdef1) by @alice"));
/// ```
pub fn build_summary_prompt(bullets: &str, max_size: usize) -> Result<String> {
    // Validate size BEFORE allocating the combined string
    let combined_size = PROMPT_HEADER.len() + bullets.len() + PROMPT_FOOTER.len();

    if combined_size > max_size {
        return Err(ReleaseError::Summary(format!(
            "Prompt size ({} bytes) exceeds maximum allowed size ({} bytes)",
            combined_size, max_size
        )));
    }

    Ok(format!("{}{}{}", PROMPT_HEADER, bullets, PROMPT_FOOTER))
}
